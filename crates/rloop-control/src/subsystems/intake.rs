//! 进球机构：一个伸缩电磁阀 + 一个滚轮

use super::{Subsystem, SubsystemOutputs};
use crate::commands::{Commands, IntakeState};
use crate::state::RobotState;
use rloop_driver::{ActuatorCommand, ActuatorId, ControllerOutput, ids};
use smallvec::smallvec;

const ACTUATORS: [ActuatorId; 2] = [ids::INTAKE_SOLENOID, ids::INTAKE_ROLLER];

/// 吸球时的滚轮占空比
const ROLLER_INTAKE_OUTPUT: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct Intake {
    extend: bool,
    roller: ControllerOutput,
}

impl Default for Intake {
    fn default() -> Self {
        Self::new()
    }
}

impl Intake {
    pub const NAME: &'static str = "intake";

    pub fn new() -> Self {
        Self {
            extend: false,
            roller: ControllerOutput::idle(),
        }
    }

    pub fn wants_extended(&self) -> bool {
        self.extend
    }

    pub fn roller_output(&self) -> &ControllerOutput {
        &self.roller
    }
}

impl Subsystem for Intake {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actuators(&self) -> &'static [ActuatorId] {
        &ACTUATORS
    }

    fn update(&mut self, commands: &Commands, state: &RobotState) {
        let wanted = commands.intake_wanted_state;
        self.extend = wanted != IntakeState::Stow;

        // 滚轮只在机构确认放下后转动
        if wanted == IntakeState::Intake && state.intake_is_extended {
            self.roller.set_percent_output(ROLLER_INTAKE_OUTPUT);
        } else {
            self.roller.set_idle();
        }
    }

    fn outputs(&self) -> SubsystemOutputs {
        smallvec![
            (ids::INTAKE_SOLENOID, ActuatorCommand::Solenoid(self.extend)),
            (ids::INTAKE_ROLLER, ActuatorCommand::Motor(self.roller)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rloop_driver::OutputMode;

    #[test]
    fn test_stow_retracts_and_idles() {
        let mut intake = Intake::new();
        intake.update(&Commands::new(), &RobotState::new());
        assert!(!intake.wants_extended());
        assert_eq!(intake.roller_output().mode(), OutputMode::Idle);
    }

    #[test]
    fn test_roller_waits_for_extension() {
        let mut intake = Intake::new();
        let mut commands = Commands::new();
        commands.intake_wanted_state = IntakeState::Intake;
        let mut state = RobotState::new();

        intake.update(&commands, &state);
        assert!(intake.wants_extended());
        assert_eq!(intake.roller_output().mode(), OutputMode::Idle);

        state.intake_is_extended = true;
        intake.update(&commands, &state);
        assert_eq!(intake.roller_output().mode(), OutputMode::PercentOutput);
        assert!((intake.roller_output().reference() - ROLLER_INTAKE_OUTPUT).abs() < 1e-9);
    }

    #[test]
    fn test_lower_extends_without_roller() {
        let mut intake = Intake::new();
        let mut commands = Commands::new();
        commands.intake_wanted_state = IntakeState::Lower;
        let mut state = RobotState::new();
        state.intake_is_extended = true;

        intake.update(&commands, &state);
        let outputs = intake.outputs();
        assert_eq!(outputs[0], (ids::INTAKE_SOLENOID, ActuatorCommand::Solenoid(true)));
        assert_eq!(
            outputs[1],
            (ids::INTAKE_ROLLER, ActuatorCommand::Motor(ControllerOutput::idle()))
        );
    }
}
