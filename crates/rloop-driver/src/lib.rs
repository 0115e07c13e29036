//! 硬件驱动层
//!
//! 本模块定义控制循环与物理硬件之间的边界，包括：
//! - 读写边界 trait（[`HardwareRead`] / [`HardwareWrite`]）
//! - 结构化执行器指令（模式标签 + 目标值 + 增益）
//! - 变化检测输出缓存（跳过冗余的总线写入）
//! - 粘滞故障（sticky fault）表示
//! - Mock 硬件（`mock` feature），用于无硬件测试与仿真
//!
//! # 使用场景
//!
//! 真实机器人为每种控制器实现读写 trait；控制层只依赖 trait，不接触厂商 API。

pub mod actuator;
pub mod cache;
mod error;
pub mod faults;
pub mod hardware;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use actuator::ids;
pub use actuator::{ActuatorCommand, ActuatorId, ControllerOutput, Gains, NeutralMode, OutputMode};
pub use cache::{CacheStats, DEFAULT_TOLERANCE, OutputCache};
pub use error::DriverError;
pub use faults::StickyFaults;
pub use hardware::{
    DriveSide, DriverStationState, GameMode, Hardware, HardwareRead, HardwareWrite,
    HeadingReading, OperatorInputs, VisionMode, WheelReading,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockHardware;
