//! # rloop Tools - 无硬件依赖的控制原语
//!
//! **依赖原则**: 不依赖任何硬件层（`rloop-driver`）或调度层（`rloop-control`），
//! 所有类型都可以在纯单元测试中使用。
//!
//! ## 包含模块
//!
//! - `interpolation` - 有序插值表（线性插值 + 边界钳位）
//! - `debounce` - 时间去抖布尔状态机
//! - `odometry` - 差速底盘里程计积分
//!
//! ## 使用示例
//!
//! ```rust
//! use rloop_tools::InterpolationTable;
//!
//! let mut table = InterpolationTable::new();
//! table.put(0.0, 0.0).unwrap();
//! table.put(1.0, 1.0).unwrap();
//! assert_eq!(table.get_interpolated(0.5).unwrap(), 0.5);
//! ```

// ⚠️ 禁止引入 rloop-driver / rloop-control

pub mod debounce;
mod error;
pub mod interpolation;
pub mod odometry;

// 重新导出常用类型
pub use debounce::DebouncedBooleanState;
pub use error::ToolsError;
pub use interpolation::InterpolationTable;
pub use odometry::{OdometryIntegrator, Pose2d};
