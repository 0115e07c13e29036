//! 工具层错误类型定义

use thiserror::Error;

/// 工具层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolsError {
    /// 对象处于不允许该操作的状态（如查询空插值表）
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// 非有限的键（NaN / ±inf）
    #[error("Invalid key: {0}")]
    InvalidKey(f64),
}
