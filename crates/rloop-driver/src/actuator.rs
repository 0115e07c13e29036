//! 执行器指令模型
//!
//! 控制层通过 [`ActuatorCommand`] 描述"希望执行器处于什么状态"，
//! 由 [`OutputCache`](crate::cache::OutputCache) 决定是否真的需要写总线。

use std::fmt;

/// 执行器标识
///
/// 使用静态名称（如 `"drive.left"`），便于日志与故障诊断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorId(&'static str);

impl ActuatorId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// 硬件适配层注册的执行器
pub mod ids {
    use super::ActuatorId;

    pub const DRIVE_LEFT: ActuatorId = ActuatorId::new("drive.left");
    pub const DRIVE_RIGHT: ActuatorId = ActuatorId::new("drive.right");
    pub const INTAKE_ROLLER: ActuatorId = ActuatorId::new("intake.roller");
    pub const INTAKE_SOLENOID: ActuatorId = ActuatorId::new("intake.solenoid");
    pub const SHOOTER_FLYWHEEL: ActuatorId = ActuatorId::new("shooter.flywheel");

    /// 所有电机控制器（用于故障轮询和空闲模式设置）
    pub const DRIVE_MOTORS: [ActuatorId; 2] = [DRIVE_LEFT, DRIVE_RIGHT];
}

/// 电机控制器空闲模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeutralMode {
    /// 制动：短接绕组，快速停止
    #[default]
    Brake,
    /// 滑行：自由转动
    Coast,
}

/// 控制模式标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// 无输出
    #[default]
    Idle,
    /// 开环占空比 [-1, 1]
    PercentOutput,
    /// 闭环速度
    Velocity,
    /// 闭环位置
    Position,
    /// 带运动曲线的闭环位置
    ProfiledPosition,
    /// 带运动曲线的闭环速度
    ProfiledVelocity,
}

impl OutputMode {
    /// 是否为闭环模式（需要下发增益）
    pub fn is_closed_loop(self) -> bool {
        !matches!(self, Self::Idle | Self::PercentOutput)
    }
}

/// 闭环增益
///
/// `max_velocity` / `max_acceleration` 仅在带运动曲线的模式下有意义。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gains {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
    pub i_zone: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

impl Gains {
    pub const fn pidf(p: f64, i: f64, d: f64, f: f64) -> Self {
        Self {
            p,
            i,
            d,
            f,
            i_zone: 0.0,
            max_velocity: 0.0,
            max_acceleration: 0.0,
        }
    }

    pub const fn with_profile(mut self, max_velocity: f64, max_acceleration: f64) -> Self {
        self.max_velocity = max_velocity;
        self.max_acceleration = max_acceleration;
        self
    }

    /// 逐字段绝对容差比较
    pub fn approx_eq(&self, other: &Gains, tolerance: f64) -> bool {
        near(self.p, other.p, tolerance)
            && near(self.i, other.i, tolerance)
            && near(self.d, other.d, tolerance)
            && near(self.f, other.f, tolerance)
            && near(self.i_zone, other.i_zone, tolerance)
            && near(self.max_velocity, other.max_velocity, tolerance)
            && near(self.max_acceleration, other.max_acceleration, tolerance)
    }
}

/// 电机控制器输出：模式标签 + 目标值 + 前馈 + 增益
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerOutput {
    mode: OutputMode,
    reference: f64,
    arbitrary_demand: f64,
    gains: Gains,
}

impl ControllerOutput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn percent_output(percent: f64) -> Self {
        let mut output = Self::default();
        output.set_percent_output(percent);
        output
    }

    pub fn set_idle(&mut self) {
        *self = Self::default();
    }

    pub fn set_percent_output(&mut self, percent: f64) {
        *self = Self {
            mode: OutputMode::PercentOutput,
            reference: percent.clamp(-1.0, 1.0),
            ..Self::default()
        };
    }

    pub fn set_target_velocity(&mut self, velocity: f64, gains: Gains) {
        self.set_closed_loop(OutputMode::Velocity, velocity, 0.0, gains);
    }

    pub fn set_target_velocity_profiled(&mut self, velocity: f64, gains: Gains) {
        self.set_closed_loop(OutputMode::ProfiledVelocity, velocity, 0.0, gains);
    }

    pub fn set_target_position(&mut self, position: f64, gains: Gains) {
        self.set_closed_loop(OutputMode::Position, position, 0.0, gains);
    }

    /// 位置闭环 + 任意前馈（如重力补偿）
    pub fn set_target_position_with_feedforward(
        &mut self,
        position: f64,
        arbitrary_demand: f64,
        gains: Gains,
    ) {
        self.set_closed_loop(OutputMode::Position, position, arbitrary_demand, gains);
    }

    pub fn set_target_position_profiled(
        &mut self,
        position: f64,
        arbitrary_demand: f64,
        gains: Gains,
    ) {
        self.set_closed_loop(OutputMode::ProfiledPosition, position, arbitrary_demand, gains);
    }

    fn set_closed_loop(&mut self, mode: OutputMode, reference: f64, arbitrary_demand: f64, gains: Gains) {
        *self = Self {
            mode,
            reference,
            arbitrary_demand,
            gains,
        };
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn arbitrary_demand(&self) -> f64 {
        self.arbitrary_demand
    }

    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    /// 模式标签相同且所有数值字段在容差内
    pub fn approx_eq(&self, other: &ControllerOutput, tolerance: f64) -> bool {
        self.mode == other.mode
            && near(self.reference, other.reference, tolerance)
            && near(self.arbitrary_demand, other.arbitrary_demand, tolerance)
            && self.gains.approx_eq(&other.gains, tolerance)
    }
}

/// 单个执行器的结构化指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    Motor(ControllerOutput),
    Solenoid(bool),
}

impl ActuatorCommand {
    /// 用于错误信息的指令类型名
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Motor(_) => "motor",
            Self::Solenoid(_) => "solenoid",
        }
    }

    pub fn approx_eq(&self, other: &ActuatorCommand, tolerance: f64) -> bool {
        match (self, other) {
            (Self::Motor(a), Self::Motor(b)) => a.approx_eq(b, tolerance),
            (Self::Solenoid(a), Self::Solenoid(b)) => a == b,
            _ => false,
        }
    }
}

impl From<ControllerOutput> for ActuatorCommand {
    fn from(output: ControllerOutput) -> Self {
        Self::Motor(output)
    }
}

#[inline]
fn near(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
