//! # rloop Control - 固定周期机器人控制循环
//!
//! 每 20 ms（可配置）执行一次：读取传感器 → 推进例程 → 子系统计算输出 →
//! 经变化检测写入硬件 → 执行服务。
//!
//! ## 模块
//!
//! - `state` / `commands` - 本周期的观测（[`RobotState`]）与期望（[`Commands`]）
//! - `routine` - 可组合例程与调度器
//! - `subsystems` - 底盘 / 进球 / 射球
//! - `reader` / `writer` - 硬件读写纪律（故障轮询、输出缓存、电磁阀去抖）
//! - `operator` - 操作员输入映射
//! - `service` - 周期性服务与跨线程外部指令
//! - `config` - TOML 配置与变更订阅
//! - `probe` - 周期耗时检查点与超时统计
//! - `robot` / `loop_runner` - 组装与固定周期驱动
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use rloop_control::{ConfigStore, LoopConfig, Robot, auto_by_name, run_loop};
//! use rloop_driver::MockHardware;
//! use std::sync::atomic::AtomicBool;
//!
//! let store = ConfigStore::new(RobotConfig::load_from_file("robot.toml")?);
//! let loop_config = LoopConfig::from_robot_config(&store.current());
//! let auto = auto_by_name("drive_forward").unwrap();
//! let mut robot = Robot::new(MockHardware::new(), store, auto)?;
//!
//! let stop = AtomicBool::new(false);
//! run_loop(&mut robot, &loop_config, &stop, |robot, _| {
//!     robot.hardware_mut().step(loop_config.period)
//! })?;
//! ```

pub mod auto;
pub mod commands;
pub mod config;
mod error;
pub mod loop_runner;
pub mod operator;
pub mod probe;
pub mod reader;
pub mod robot;
pub mod routine;
pub mod service;
pub mod state;
pub mod subsystems;
pub mod writer;

// 重新导出常用类型
pub use auto::{AUTO_NAMES, AutoSelector, auto_by_name};
pub use commands::{Commands, DriveState, IntakeState, ShooterState};
pub use config::{ConfigStore, ConfigSubscription, RobotConfig};
pub use error::ControlError;
pub use loop_runner::{LoopConfig, LoopSummary, run_loop};
pub use probe::{LoopProbe, LoopReport, LoopStatistics};
pub use robot::Robot;
pub use routine::{Routine, RoutineManager, RoutineNode, RoutinePhase};
pub use service::{ExternalCommand, ExternalCommandSender, RobotService};
pub use state::{AtomicGamePeriod, GamePeriod, RobotState};
