//! 驱动层错误类型定义

use crate::actuator::ActuatorId;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 总线写入失败
    #[error("Write to {id} failed: {reason}")]
    WriteFailed { id: ActuatorId, reason: String },

    /// 控制器无响应（掉线、未上电）
    #[error("Controller {0} not responding")]
    Disconnected(ActuatorId),

    /// 未知执行器（未在硬件适配层注册）
    #[error("Unknown actuator: {0}")]
    UnknownActuator(ActuatorId),

    /// 执行器不支持该指令类型（如向电磁阀写电机指令）
    #[error("Actuator {id} does not accept {kind} commands")]
    UnsupportedCommand { id: ActuatorId, kind: &'static str },
}
