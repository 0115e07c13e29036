//! 发射机构：单飞轮速度闭环

use super::{Subsystem, SubsystemOutputs};
use crate::commands::{Commands, ShooterState};
use crate::state::RobotState;
use rloop_driver::{ActuatorCommand, ActuatorId, ControllerOutput, Gains, ids};
use rloop_tools::InterpolationTable;
use smallvec::smallvec;
use tracing::warn;

const ACTUATORS: [ActuatorId; 1] = [ids::SHOOTER_FLYWHEEL];

/// 飞轮速度环增益
const FLYWHEEL_GAINS: Gains = Gains::pidf(0.0005, 0.0, 0.0, 0.000_18);

#[derive(Debug, Clone)]
pub struct Shooter {
    distance_to_velocity: InterpolationTable,
    flywheel: ControllerOutput,
    /// 最近一次有效的视觉目标转速，视觉丢失时保持
    last_vision_velocity: Option<f64>,
}

impl Shooter {
    pub const NAME: &'static str = "shooter";

    pub fn new(distance_to_velocity: InterpolationTable) -> Self {
        Self {
            distance_to_velocity,
            flywheel: ControllerOutput::idle(),
            last_vision_velocity: None,
        }
    }

    pub fn flywheel_output(&self) -> &ControllerOutput {
        &self.flywheel
    }

    fn vision_velocity(&mut self, state: &RobotState) -> Option<f64> {
        if let Some(distance) = state.vision_distance_inches {
            match self.distance_to_velocity.get_interpolated(distance) {
                Ok(velocity) => self.last_vision_velocity = Some(velocity),
                Err(e) => warn!("shooter: cannot map distance {:.1}: {}", distance, e),
            }
        }
        self.last_vision_velocity
    }
}

impl Subsystem for Shooter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actuators(&self) -> &'static [ActuatorId] {
        &ACTUATORS
    }

    fn update(&mut self, commands: &Commands, state: &RobotState) {
        let target = match commands.shooter_wanted_state {
            ShooterState::Idle => {
                self.last_vision_velocity = None;
                None
            },
            ShooterState::Custom { velocity } => Some(velocity),
            ShooterState::VisionDistance => self.vision_velocity(state),
        };

        match target {
            Some(velocity) => self.flywheel.set_target_velocity(velocity, FLYWHEEL_GAINS),
            None => self.flywheel.set_idle(),
        }
    }

    fn outputs(&self) -> SubsystemOutputs {
        smallvec![(ids::SHOOTER_FLYWHEEL, ActuatorCommand::Motor(self.flywheel))]
    }
}
