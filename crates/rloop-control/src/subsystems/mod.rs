//! 子系统
//!
//! 每个子系统把 [`Commands`] + [`RobotState`] 转换为自己执行器的目标指令。
//! 子系统不接触硬件：写入统一由 `HardwareWriter` 经变化检测缓存完成。

mod drive;
mod intake;
mod shooter;

pub use drive::Drive;
pub use intake::Intake;
pub use shooter::Shooter;

use crate::commands::Commands;
use crate::config::RobotConfig;
use crate::error::ControlError;
use crate::state::RobotState;
use rloop_driver::{ActuatorCommand, ActuatorId};
use smallvec::SmallVec;

/// 所有已知子系统的配置名
pub const SUBSYSTEM_NAMES: [&str; 3] = [Drive::NAME, Intake::NAME, Shooter::NAME];

/// 单个子系统一周期的输出
pub type SubsystemOutputs = SmallVec<[(ActuatorId, ActuatorCommand); 4]>;

/// 子系统接口
pub trait Subsystem {
    /// 配置名
    fn name(&self) -> &'static str;

    /// 该子系统拥有的执行器
    fn actuators(&self) -> &'static [ActuatorId];

    /// 根据期望与状态计算目标（每周期一次）
    fn update(&mut self, commands: &Commands, state: &RobotState);

    /// 最近一次 `update` 的目标指令
    fn outputs(&self) -> SubsystemOutputs;
}

/// 按配置顺序构造启用的子系统
///
/// 返回顺序即每周期的更新顺序，运行期间不再改变。
pub fn build_subsystems(config: &RobotConfig) -> Result<Vec<Box<dyn Subsystem>>, ControlError> {
    config
        .enabled_subsystems
        .iter()
        .map(|name| -> Result<Box<dyn Subsystem>, ControlError> {
            match name.as_str() {
                Drive::NAME => Ok(Box::new(Drive::new(config.drive_deadband))),
                Intake::NAME => Ok(Box::new(Intake::new())),
                Shooter::NAME => Ok(Box::new(Shooter::new(config.shooter_table()?))),
                other => Err(ControlError::UnknownSubsystem(other.to_string())),
            }
        })
        .collect()
}
