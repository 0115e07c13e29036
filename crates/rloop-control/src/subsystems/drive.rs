//! 差速底盘

use super::{Subsystem, SubsystemOutputs};
use crate::commands::{Commands, DriveState};
use crate::state::RobotState;
use rloop_driver::{ActuatorCommand, ActuatorId, ControllerOutput, ids};
use smallvec::smallvec;

/// 差速底盘
///
/// - `Neutral`: 两侧空闲
/// - `Teleop`: 油门 + 转向（正值右转），非原地转向时转向量随油门缩放
/// - `Outputs`: 直接使用 `Commands` 中的左右输出
#[derive(Debug, Clone)]
pub struct Drive {
    deadband: f64,
    left: ControllerOutput,
    right: ControllerOutput,
}

impl Drive {
    pub const NAME: &'static str = "drive";

    pub fn new(deadband: f64) -> Self {
        Self {
            deadband: deadband.abs(),
            left: ControllerOutput::idle(),
            right: ControllerOutput::idle(),
        }
    }

    fn apply_deadband(&self, value: f64) -> f64 {
        if value.abs() < self.deadband { 0.0 } else { value }
    }

    fn teleop(&mut self, commands: &Commands) {
        let throttle = self.apply_deadband(commands.drive_wanted_throttle);
        let wheel = self.apply_deadband(commands.drive_wanted_wheel);
        let turn = if commands.drive_wanted_quick_turn {
            wheel
        } else {
            wheel * throttle.abs()
        };

        let mut left = throttle + turn;
        let mut right = throttle - turn;
        let max = left.abs().max(right.abs());
        if max > 1.0 {
            left /= max;
            right /= max;
        }
        self.left.set_percent_output(left);
        self.right.set_percent_output(right);
    }

    pub fn left_output(&self) -> &ControllerOutput {
        &self.left
    }

    pub fn right_output(&self) -> &ControllerOutput {
        &self.right
    }
}

impl Subsystem for Drive {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actuators(&self) -> &'static [ActuatorId] {
        &ids::DRIVE_MOTORS
    }

    fn update(&mut self, commands: &Commands, _state: &RobotState) {
        match commands.drive_wanted_state {
            DriveState::Neutral => {
                self.left.set_idle();
                self.right.set_idle();
            },
            DriveState::Teleop => self.teleop(commands),
            DriveState::Outputs => {
                self.left = commands.drive_wanted_left_output;
                self.right = commands.drive_wanted_right_output;
            },
        }
    }

    fn outputs(&self) -> SubsystemOutputs {
        smallvec![
            (ids::DRIVE_LEFT, ActuatorCommand::Motor(self.left)),
            (ids::DRIVE_RIGHT, ActuatorCommand::Motor(self.right)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rloop_driver::OutputMode;

    fn teleop(throttle: f64, wheel: f64, quick_turn: bool) -> (f64, f64) {
        let mut drive = Drive::new(0.05);
        let mut commands = Commands::new();
        commands.set_drive_teleop();
        commands.drive_wanted_throttle = throttle;
        commands.drive_wanted_wheel = wheel;
        commands.drive_wanted_quick_turn = quick_turn;
        drive.update(&commands, &RobotState::new());
        (drive.left_output().reference(), drive.right_output().reference())
    }

    #[test]
    fn test_neutral_is_idle() {
        let mut drive = Drive::new(0.05);
        drive.update(&Commands::new(), &RobotState::new());
        assert_eq!(drive.left_output().mode(), OutputMode::Idle);
        assert_eq!(drive.right_output().mode(), OutputMode::Idle);
    }

    #[test]
    fn test_teleop_straight_and_deadband() {
        assert_eq!(teleop(0.5, 0.0, false), (0.5, 0.5));
        assert_eq!(teleop(0.03, 0.04, true), (0.0, 0.0));
    }

    #[test]
    fn test_teleop_turn_scales_with_throttle() {
        let (left, right) = teleop(0.5, 0.4, false);
        assert!((left - 0.7).abs() < 1e-9);
        assert!((right - 0.3).abs() < 1e-9);

        // 无油门时非原地转向不转动
        assert_eq!(teleop(0.0, 0.8, false), (0.0, 0.0));
    }

    #[test]
    fn test_quick_turn_spins_in_place() {
        let (left, right) = teleop(0.0, 0.6, true);
        assert!((left - 0.6).abs() < 1e-9);
        assert!((right + 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_teleop_output_is_normalized() {
        let (left, right) = teleop(1.0, 1.0, true);
        assert!((left - 1.0).abs() < 1e-9);
        assert!(right.abs() < 1e-9);
    }

    #[test]
    fn test_outputs_pass_through() {
        let mut drive = Drive::new(0.05);
        let mut commands = Commands::new();
        let mut left = ControllerOutput::idle();
        left.set_target_velocity(1.5, rloop_driver::Gains::pidf(0.1, 0.0, 0.0, 0.2));
        commands.set_drive_outputs(left, ControllerOutput::percent_output(-0.2));

        drive.update(&commands, &RobotState::new());
        let outputs = drive.outputs();
        assert_eq!(outputs[0], (ids::DRIVE_LEFT, ActuatorCommand::Motor(left)));
        assert_eq!(outputs[1].0, ids::DRIVE_RIGHT);
    }
}
