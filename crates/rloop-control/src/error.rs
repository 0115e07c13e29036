//! 控制层错误类型

use rloop_tools::ToolsError;
use thiserror::Error;

/// 控制层错误
///
/// 只出现在构造 / 配置路径上；`Robot::tick` 内部的错误全部就地记录日志，不向外传播。
#[derive(Error, Debug)]
pub enum ControlError {
    /// 工具层错误（如插值表构造失败）
    #[error("Tools error: {0}")]
    Tools(#[from] ToolsError),

    /// 配置解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// 配置文件读取失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置中的子系统名称未知
    #[error("Unknown subsystem: {0}")]
    UnknownSubsystem(String),

    /// 配置中的服务名称未知
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// 配置值非法
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 外部指令队列已满
    #[error("Command channel full")]
    ChannelFull,

    /// 外部指令队列已关闭（控制循环已退出）
    #[error("Command channel closed")]
    ChannelClosed,
}
