//! 硬件读写边界
//!
//! - [`HardwareRead`]: 每周期读取的传感器 / 比赛状态 / 操作员输入，无副作用
//! - [`HardwareWrite`]: 执行器写入、空闲模式、故障清除、传感器清零等
//!
//! 控制循环独占一个实现了两者的 [`Hardware`] 实例（依赖注入，无全局单例）。

use crate::actuator::{ActuatorCommand, ActuatorId, NeutralMode};
use crate::error::DriverError;
use crate::faults::StickyFaults;

/// 驱动站请求的比赛阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Teleop,
    Auto,
    Test,
}

/// 驱动站状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverStationState {
    pub enabled: bool,
    pub mode: GameMode,
}

impl DriverStationState {
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            mode: GameMode::Teleop,
        }
    }

    pub const fn enabled(mode: GameMode) -> Self {
        Self {
            enabled: true,
            mode,
        }
    }
}

/// 航向传感器读数
///
/// `ready == false` 时其余字段无意义，调用方应保留上一周期的值。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadingReading {
    pub ready: bool,
    pub yaw_degrees: f64,
    pub yaw_rate_degrees: f64,
}

/// 单侧车轮读数（米 / 米每秒）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelReading {
    pub position: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveSide {
    Left,
    Right,
}

/// 操作员输入（手柄）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OperatorInputs {
    /// 油门 [-1, 1]
    pub drive_throttle: f64,
    /// 转向 [-1, 1]
    pub drive_wheel: f64,
    pub drive_quick_turn: bool,
    pub intake_pressed: bool,
    pub shoot_pressed: bool,
    pub vision_pressed: bool,
}

/// 视觉相机模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisionMode {
    /// 驾驶员视角，补光灯关闭
    #[default]
    Driver,
    /// 目标识别，补光灯强制开启
    Vision,
}

/// 硬件读边界
pub trait HardwareRead {
    fn driver_station(&self) -> DriverStationState;

    /// 比赛相关的附加信息（可为空）
    fn game_message(&self) -> String;

    fn heading(&self) -> HeadingReading;

    fn wheel(&self, side: DriveSide) -> WheelReading;

    /// 视觉估计的目标距离（英寸），无目标时为 `None`
    fn vision_distance_inches(&self) -> Option<f64>;

    fn operator_inputs(&self) -> OperatorInputs;

    /// 查询粘滞故障
    fn sticky_faults(&self, id: ActuatorId) -> Result<StickyFaults, DriverError>;
}

/// 硬件写边界
pub trait HardwareWrite {
    /// 启动时的一次性控制器配置（电流限制、反向、传感器相位等）
    fn configure(&mut self, id: ActuatorId) -> Result<(), DriverError>;

    /// 物理写入一条执行器指令
    ///
    /// 调用方（[`OutputCache`](crate::cache::OutputCache)）负责跳过冗余写入。
    fn write(&mut self, id: ActuatorId, command: &ActuatorCommand) -> Result<(), DriverError>;

    /// 设置空闲模式（幂等）
    fn set_neutral_mode(&mut self, id: ActuatorId, mode: NeutralMode) -> Result<(), DriverError>;

    fn clear_sticky_faults(&mut self, id: ActuatorId) -> Result<(), DriverError>;

    /// 重写控制器内置位置传感器的读数
    fn set_sensor_position(&mut self, id: ActuatorId, position: f64) -> Result<(), DriverError>;

    /// 重写航向传感器读数
    fn set_heading(&mut self, degrees: f64) -> Result<(), DriverError>;

    fn set_compressor(&mut self, on: bool);

    fn set_vision(&mut self, mode: VisionMode, pipeline: u8);

    fn set_rumble(&mut self, on: bool);
}

/// 同时具备读写能力的硬件
pub trait Hardware: HardwareRead + HardwareWrite {}

impl<T: HardwareRead + HardwareWrite> Hardware for T {}
