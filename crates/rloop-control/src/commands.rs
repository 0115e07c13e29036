//! 期望输出记录
//!
//! [`Commands`] 由操作员输入层和活动例程写入，由子系统读取。
//! 每个字段每周期只应有一个逻辑写者（例程之间通过调度互斥）。

use crate::routine::RoutineNode;
use rloop_driver::ControllerOutput;
use rloop_tools::Pose2d;

/// 底盘期望状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveState {
    /// 无输出
    #[default]
    Neutral,
    /// 操作员手柄控制
    Teleop,
    /// 例程直接给出左右输出
    Outputs,
}

/// 进球机构期望状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntakeState {
    /// 收起
    #[default]
    Stow,
    /// 放下但不转动
    Lower,
    /// 放下并吸球（到位后才转动）
    Intake,
}

/// 发射机构期望状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ShooterState {
    #[default]
    Idle,
    /// 指定飞轮转速
    Custom { velocity: f64 },
    /// 按视觉距离查表得到转速
    VisionDistance,
}

/// 期望输出记录
#[derive(Debug)]
pub struct Commands {
    pub drive_wanted_state: DriveState,
    pub drive_wanted_throttle: f64,
    pub drive_wanted_wheel: f64,
    pub drive_wanted_quick_turn: bool,
    pub drive_wanted_left_output: ControllerOutput,
    pub drive_wanted_right_output: ControllerOutput,
    /// 一次性位姿复位请求，被消费后清空
    pub drive_wanted_odometry_pose: Option<Pose2d>,

    pub intake_wanted_state: IntakeState,
    pub shooter_wanted_state: ShooterState,

    pub vision_wanted: bool,
    pub vision_wanted_pipeline: u8,
    pub wanted_compression: bool,
    pub wanted_rumble: bool,

    /// 下一次调度前先取消所有正在运行的例程
    pub should_clear_current_routines: bool,
    routines_wanted: Vec<RoutineNode>,
}

impl Default for Commands {
    fn default() -> Self {
        Self::new()
    }
}

impl Commands {
    pub fn new() -> Self {
        Self {
            drive_wanted_state: DriveState::Neutral,
            drive_wanted_throttle: 0.0,
            drive_wanted_wheel: 0.0,
            drive_wanted_quick_turn: false,
            drive_wanted_left_output: ControllerOutput::idle(),
            drive_wanted_right_output: ControllerOutput::idle(),
            drive_wanted_odometry_pose: None,
            intake_wanted_state: IntakeState::Stow,
            shooter_wanted_state: ShooterState::Idle,
            vision_wanted: false,
            vision_wanted_pipeline: 0,
            wanted_compression: true,
            wanted_rumble: false,
            should_clear_current_routines: false,
            routines_wanted: Vec::new(),
        }
    }

    /// 恢复到安全空闲状态（阶段切换时调用）
    ///
    /// 未被调度的例程请求和未消费的位姿复位请求一并丢弃。
    pub fn reset_to_idle(&mut self) {
        *self = Self::new();
    }

    /// 请求调度一个例程（在下一次 `RoutineManager::update` 时启动）
    pub fn add_wanted_routine(&mut self, routine: RoutineNode) {
        self.routines_wanted.push(routine);
    }

    /// 取出所有待调度的例程（FIFO 顺序）
    pub fn take_wanted_routines(&mut self) -> Vec<RoutineNode> {
        std::mem::take(&mut self.routines_wanted)
    }

    pub fn wanted_routine_count(&self) -> usize {
        self.routines_wanted.len()
    }

    pub fn set_drive_neutral(&mut self) {
        self.drive_wanted_state = DriveState::Neutral;
    }

    pub fn set_drive_teleop(&mut self) {
        self.drive_wanted_state = DriveState::Teleop;
    }

    /// 直接指定左右输出
    pub fn set_drive_outputs(&mut self, left: ControllerOutput, right: ControllerOutput) {
        self.drive_wanted_state = DriveState::Outputs;
        self.drive_wanted_left_output = left;
        self.drive_wanted_right_output = right;
    }

    /// 是否处于安全空闲状态
    pub fn is_idle(&self) -> bool {
        self.drive_wanted_state == DriveState::Neutral
            && self.intake_wanted_state == IntakeState::Stow
            && self.shooter_wanted_state == ShooterState::Idle
            && !self.vision_wanted
            && !self.wanted_rumble
            && self.routines_wanted.is_empty()
            && self.drive_wanted_odometry_pose.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{RoutineNode, WaitRoutine};
    use std::time::Duration;

    #[test]
    fn test_default_is_idle() {
        assert!(Commands::new().is_idle());
    }

    #[test]
    fn test_reset_to_idle_discards_requests() {
        let mut commands = Commands::new();
        commands.set_drive_outputs(
            ControllerOutput::percent_output(0.3),
            ControllerOutput::percent_output(0.3),
        );
        commands.intake_wanted_state = IntakeState::Intake;
        commands.shooter_wanted_state = ShooterState::Custom { velocity: 3000.0 };
        commands.drive_wanted_odometry_pose = Some(Pose2d::identity());
        commands.add_wanted_routine(RoutineNode::leaf(WaitRoutine::new(Duration::from_secs(1))));
        assert!(!commands.is_idle());

        commands.reset_to_idle();
        assert!(commands.is_idle());
        assert_eq!(commands.wanted_routine_count(), 0);
        assert!(commands.wanted_compression);
    }

    #[test]
    fn test_take_wanted_routines_is_fifo() {
        let mut commands = Commands::new();
        commands.add_wanted_routine(RoutineNode::leaf(WaitRoutine::new(Duration::from_secs(1))));
        commands.add_wanted_routine(RoutineNode::sequential(Vec::new()));

        let routines = commands.take_wanted_routines();
        assert_eq!(routines.len(), 2);
        assert_eq!(routines[0].name(), "Wait");
        assert_eq!(routines[1].name(), "Sequential");
        assert_eq!(commands.wanted_routine_count(), 0);
    }
}
