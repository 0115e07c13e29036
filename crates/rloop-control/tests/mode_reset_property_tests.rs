//! 阶段切换属性测试
//!
//! 任意的输入 / 例程 / 外部指令序列之后，阶段切换所在的周期结束时：
//! - 没有切换前启动的例程在运行
//! - 切换到 Disabled 时 Commands 处于安全空闲，所有执行器输出为空闲

mod common;

use common::Harness;
use proptest::prelude::*;
use rloop_control::routine::{DriveOutputsRoutine, WaitRoutine};
use rloop_control::{ExternalCommand, GamePeriod, IntakeState, RoutineNode, ShooterState};
use rloop_driver::{DriverStationState, GameMode, OperatorInputs, OutputMode, ids};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Step {
    Tick {
        mode: u8,
        throttle: f64,
        intake: bool,
        shoot: bool,
    },
    AddRoutine(u64),
    Send(u8),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0u8..4, -1.0f64..1.0, any::<bool>(), any::<bool>()).prop_map(
            |(mode, throttle, intake, shoot)| Step::Tick {
                mode,
                throttle,
                intake,
                shoot,
            }
        ),
        1 => (1u64..500).prop_map(Step::AddRoutine),
        1 => (0u8..3).prop_map(Step::Send),
    ]
}

fn driver_station(mode: u8) -> DriverStationState {
    match mode {
        1 => DriverStationState::enabled(GameMode::Auto),
        2 => DriverStationState::enabled(GameMode::Teleop),
        3 => DriverStationState::enabled(GameMode::Test),
        _ => DriverStationState::disabled(),
    }
}

fn external(kind: u8) -> ExternalCommand {
    match kind {
        0 => ExternalCommand::DriveFor {
            left: 0.3,
            right: -0.3,
            duration: Duration::from_millis(200),
        },
        1 => ExternalCommand::SetIntake(IntakeState::Intake),
        _ => ExternalCommand::SetShooter(ShooterState::Custom { velocity: 3000.0 }),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_transition_resets_to_idle(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut harness = Harness::new();
        harness.robot.hardware_mut().set_vision_distance(Some(100.0));
        let sender = harness.robot.command_sender();

        for step in steps {
            match step {
                Step::Tick { mode, throttle, intake, shoot } => {
                    harness.robot.hardware_mut().set_driver_station(driver_station(mode));
                    harness.set_inputs(OperatorInputs {
                        drive_throttle: throttle,
                        intake_pressed: intake,
                        shoot_pressed: shoot,
                        ..Default::default()
                    });

                    let before = harness.robot.state().game_period;
                    harness.tick();
                    let after = harness.robot.state().game_period;
                    if before == after {
                        continue;
                    }

                    prop_assert!(harness.robot.routines().is_idle());
                    if after == GamePeriod::Disabled {
                        prop_assert!(harness.robot.commands().is_idle());
                        for id in [ids::DRIVE_LEFT, ids::DRIVE_RIGHT, ids::INTAKE_ROLLER, ids::SHOOTER_FLYWHEEL] {
                            prop_assert!(harness
                                .motor(id)
                                .is_none_or(|output| output.mode() == OutputMode::Idle));
                        }
                        prop_assert_ne!(harness.solenoid(ids::INTAKE_SOLENOID), Some(true));
                    }
                },
                Step::AddRoutine(millis) => {
                    let duration = Duration::from_millis(millis);
                    harness.robot.commands_mut().add_wanted_routine(RoutineNode::parallel(vec![
                        RoutineNode::leaf(DriveOutputsRoutine::percent(0.5, duration)),
                        RoutineNode::leaf(WaitRoutine::new(duration)),
                    ]));
                },
                Step::Send(kind) => {
                    let _ = sender.send(external(kind));
                },
            }
        }
    }
}
