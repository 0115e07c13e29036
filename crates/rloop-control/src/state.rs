//! 机器人状态快照
//!
//! [`RobotState`] 由控制循环独占：读取阶段写入传感器值，其余阶段只读。
//! 位姿只能由里程计积分器修改，每个周期至多一次。

use rloop_driver::{DriverStationState, GameMode};
use rloop_tools::{OdometryIntegrator, Pose2d};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;
use tracing::debug;

/// 比赛阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GamePeriod {
    #[default]
    Disabled = 0,
    Auto = 1,
    Teleop = 2,
    Test = 3,
}

impl GamePeriod {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Disabled（最安全的阶段）。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Auto,
            2 => Self::Teleop,
            3 => Self::Test,
            _ => Self::Disabled,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Auto => "auto",
            Self::Teleop => "teleop",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for GamePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<DriverStationState> for GamePeriod {
    fn from(ds: DriverStationState) -> Self {
        if !ds.enabled {
            return Self::Disabled;
        }
        match ds.mode {
            GameMode::Auto => Self::Auto,
            GameMode::Teleop => Self::Teleop,
            GameMode::Test => Self::Test,
        }
    }
}

/// 比赛阶段（原子版本，用于线程间共享）
///
/// # 使用场景
///
/// - 控制循环在阶段切换时写入
/// - 配置变更回调（可能运行在其他线程）读取，决定是否转发变更
#[derive(Debug, Default)]
pub struct AtomicGamePeriod {
    inner: AtomicU8,
}

impl AtomicGamePeriod {
    pub fn new(period: GamePeriod) -> Self {
        Self {
            inner: AtomicU8::new(period.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> GamePeriod {
        GamePeriod::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, period: GamePeriod, ordering: Ordering) {
        self.inner.store(period.as_u8(), ordering);
    }
}

/// 机器人状态快照
#[derive(Debug, Clone)]
pub struct RobotState {
    pub game_period: GamePeriod,
    pub game_message: String,

    /// 当前周期序号
    pub tick: u64,
    /// 当前周期开始时刻（时间相关的例程以此为时钟）
    pub timestamp: Instant,

    pub drive_is_gyro_ready: bool,
    pub drive_yaw_degrees: f64,
    pub drive_yaw_angular_velocity_degrees: f64,
    pub drive_left_position: f64,
    pub drive_right_position: f64,
    pub drive_left_velocity: f64,
    pub drive_right_velocity: f64,

    pub intake_is_extended: bool,
    pub vision_distance_inches: Option<f64>,

    odometry: OdometryIntegrator,
    odometry_tick: Option<u64>,
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotState {
    pub fn new() -> Self {
        Self {
            game_period: GamePeriod::Disabled,
            game_message: String::new(),
            tick: 0,
            timestamp: Instant::now(),
            drive_is_gyro_ready: false,
            drive_yaw_degrees: 0.0,
            drive_yaw_angular_velocity_degrees: 0.0,
            drive_left_position: 0.0,
            drive_right_position: 0.0,
            drive_left_velocity: 0.0,
            drive_right_velocity: 0.0,
            intake_is_extended: false,
            vision_distance_inches: None,
            odometry: OdometryIntegrator::new(),
            odometry_tick: None,
        }
    }

    /// 开始新周期
    pub fn begin_tick(&mut self, tick: u64, timestamp: Instant) {
        self.tick = tick;
        self.timestamp = timestamp;
    }

    /// 以本周期的航向与轮位移推进里程计
    ///
    /// 同一周期内的重复调用会被忽略并返回 `false`。
    pub fn update_odometry(&mut self) -> bool {
        if self.odometry_tick == Some(self.tick) {
            debug!("odometry already integrated for tick {}", self.tick);
            return false;
        }
        self.odometry.update(
            self.drive_yaw_degrees,
            self.drive_left_position,
            self.drive_right_position,
        );
        self.odometry_tick = Some(self.tick);
        true
    }

    /// 覆盖位姿，以本状态中的当前读数作为新的参考点
    ///
    /// 硬件传感器被重写后，调用方需先重新读取读数。
    pub fn reset_odometry(&mut self, pose: Pose2d) {
        self.odometry.reset(
            pose,
            self.drive_yaw_degrees,
            self.drive_left_position,
            self.drive_right_position,
        );
    }

    /// 里程计位姿
    pub fn drive_pose(&self) -> Pose2d {
        self.odometry.pose()
    }
}
