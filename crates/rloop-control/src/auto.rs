//! 自主阶段例程选择

use crate::commands::{IntakeState, ShooterState};
use crate::routine::{
    ConditionRoutine, DriveOutputsRoutine, DriveSetOdometryRoutine, IntakeRoutine, RoutineNode,
    ShooterRoutine, WaitRoutine,
};
use crate::state::RobotState;
use rloop_tools::Pose2d;
use std::time::Duration;

/// 自主阶段开始时提供根例程
pub trait AutoSelector {
    fn name(&self) -> &str;

    /// 构造根例程（每次进入 Auto 调用一次）
    fn routine(&self, state: &RobotState) -> RoutineNode;
}

/// 什么都不做
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuto;

impl AutoSelector for NoAuto {
    fn name(&self) -> &str {
        "none"
    }

    fn routine(&self, _state: &RobotState) -> RoutineNode {
        RoutineNode::sequential(Vec::new())
    }
}

/// 从原点直线前进指定距离（或超时）
#[derive(Debug, Clone, Copy)]
pub struct DriveForwardAuto {
    pub distance_meters: f64,
    pub percent_output: f64,
    pub timeout: Duration,
}

impl Default for DriveForwardAuto {
    fn default() -> Self {
        Self {
            distance_meters: 2.0,
            percent_output: 0.4,
            timeout: Duration::from_secs(5),
        }
    }
}

impl DriveForwardAuto {
    fn drive_until_distance(&self) -> RoutineNode {
        let distance = self.distance_meters;
        RoutineNode::race(vec![
            RoutineNode::leaf(DriveOutputsRoutine::percent(self.percent_output, self.timeout)),
            RoutineNode::leaf(ConditionRoutine::new(move |state: &RobotState| {
                state.drive_pose().x >= distance
            })),
        ])
    }
}

impl AutoSelector for DriveForwardAuto {
    fn name(&self) -> &str {
        "drive_forward"
    }

    fn routine(&self, _state: &RobotState) -> RoutineNode {
        RoutineNode::sequential(vec![
            RoutineNode::leaf(DriveSetOdometryRoutine::new(Pose2d::identity())),
            self.drive_until_distance(),
        ])
    }
}

/// 放下进球机构并按视觉距离射球，然后驶离起始线
#[derive(Debug, Clone, Copy, Default)]
pub struct ShootThenDriveAuto {
    pub drive: DriveForwardAuto,
}

impl AutoSelector for ShootThenDriveAuto {
    fn name(&self) -> &str {
        "shoot_then_drive"
    }

    fn routine(&self, _state: &RobotState) -> RoutineNode {
        RoutineNode::sequential(vec![
            RoutineNode::leaf(DriveSetOdometryRoutine::new(Pose2d::identity())),
            RoutineNode::parallel(vec![
                RoutineNode::leaf(ShooterRoutine::new(
                    ShooterState::VisionDistance,
                    Duration::from_secs(3),
                )),
                RoutineNode::sequential(vec![
                    RoutineNode::leaf(WaitRoutine::new(Duration::from_secs(1))),
                    RoutineNode::leaf(IntakeRoutine::new(
                        IntakeState::Intake,
                        Duration::from_secs(2),
                    )),
                ]),
            ]),
            self.drive.drive_until_distance(),
        ])
    }
}

/// 可按名称选择的自主例程
pub const AUTO_NAMES: [&str; 3] = ["none", "drive_forward", "shoot_then_drive"];

/// 按名称构造选择器
pub fn auto_by_name(name: &str) -> Option<Box<dyn AutoSelector>> {
    match name {
        "none" => Some(Box::new(NoAuto)),
        "drive_forward" => Some(Box::new(DriveForwardAuto::default())),
        "shoot_then_drive" => Some(Box::new(ShootThenDriveAuto::default())),
        _ => None,
    }
}
