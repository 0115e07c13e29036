//! 叶子例程库

use super::Routine;
use crate::commands::{Commands, IntakeState, ShooterState};
use crate::state::RobotState;
use rloop_driver::ControllerOutput;
use rloop_tools::Pose2d;
use std::time::{Duration, Instant};

/// 从例程启动时刻起经过的时间（以 `RobotState::timestamp` 为时钟）
fn elapsed_since(start: Option<Instant>, state: &RobotState) -> Duration {
    start.map_or(Duration::ZERO, |start| {
        state.timestamp.saturating_duration_since(start)
    })
}

/// 等待固定时长
#[derive(Debug, Clone)]
pub struct WaitRoutine {
    duration: Duration,
    started_at: Option<Instant>,
}

impl WaitRoutine {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }
}

impl Routine for WaitRoutine {
    fn name(&self) -> &'static str {
        "Wait"
    }

    fn start(&mut self, _commands: &mut Commands, state: &RobotState) {
        self.started_at = Some(state.timestamp);
    }

    fn update(&mut self, _commands: &mut Commands, state: &RobotState) -> bool {
        elapsed_since(self.started_at, state) >= self.duration
    }
}

/// 超时包装：内部例程完成或超时即结束
pub struct TimedRoutine {
    inner: Box<dyn Routine>,
    timeout: Duration,
    started_at: Option<Instant>,
}

impl TimedRoutine {
    pub fn new(inner: impl Routine + 'static, timeout: Duration) -> Self {
        Self {
            inner: Box::new(inner),
            timeout,
            started_at: None,
        }
    }
}

impl Routine for TimedRoutine {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn start(&mut self, commands: &mut Commands, state: &RobotState) {
        self.started_at = Some(state.timestamp);
        self.inner.start(commands, state);
    }

    fn update(&mut self, commands: &mut Commands, state: &RobotState) -> bool {
        if self.inner.update(commands, state) {
            return true;
        }
        let timed_out = elapsed_since(self.started_at, state) >= self.timeout;
        if timed_out {
            tracing::debug!("routine {} timed out after {:?}", self.name(), self.timeout);
        }
        timed_out
    }

    fn stop(&mut self, commands: &mut Commands, state: &RobotState) {
        self.inner.stop(commands, state);
    }

    fn waypoint(&self) -> Option<Pose2d> {
        self.inner.waypoint()
    }
}

/// 请求一次位姿复位
///
/// 复位本身由控制循环在同一周期的例程阶段之后执行。
#[derive(Debug, Clone, Copy)]
pub struct DriveSetOdometryRoutine {
    target: Pose2d,
}

impl DriveSetOdometryRoutine {
    pub fn new(target: Pose2d) -> Self {
        Self { target }
    }

    pub fn target_pose(&self) -> Pose2d {
        self.target
    }
}

impl Routine for DriveSetOdometryRoutine {
    fn name(&self) -> &'static str {
        "DriveSetOdometry"
    }

    fn update(&mut self, commands: &mut Commands, _state: &RobotState) -> bool {
        commands.drive_wanted_odometry_pose = Some(self.target);
        true
    }

    fn waypoint(&self) -> Option<Pose2d> {
        Some(self.target)
    }
}

/// 以固定的左右输出驱动底盘一段时间，结束后底盘回到 Neutral
#[derive(Debug, Clone)]
pub struct DriveOutputsRoutine {
    left: ControllerOutput,
    right: ControllerOutput,
    duration: Duration,
    started_at: Option<Instant>,
}

impl DriveOutputsRoutine {
    pub fn new(left: ControllerOutput, right: ControllerOutput, duration: Duration) -> Self {
        Self {
            left,
            right,
            duration,
            started_at: None,
        }
    }

    /// 左右相同的开环占空比
    pub fn percent(percent: f64, duration: Duration) -> Self {
        let output = ControllerOutput::percent_output(percent);
        Self::new(output, output, duration)
    }
}

impl Routine for DriveOutputsRoutine {
    fn name(&self) -> &'static str {
        "DriveOutputs"
    }

    fn start(&mut self, _commands: &mut Commands, state: &RobotState) {
        self.started_at = Some(state.timestamp);
    }

    fn update(&mut self, commands: &mut Commands, state: &RobotState) -> bool {
        commands.set_drive_outputs(self.left, self.right);
        elapsed_since(self.started_at, state) >= self.duration
    }

    fn stop(&mut self, commands: &mut Commands, _state: &RobotState) {
        commands.set_drive_neutral();
    }
}

/// 保持进球机构状态一段时间，结束后收起
#[derive(Debug, Clone)]
pub struct IntakeRoutine {
    wanted: IntakeState,
    duration: Duration,
    started_at: Option<Instant>,
}

impl IntakeRoutine {
    pub fn new(wanted: IntakeState, duration: Duration) -> Self {
        Self {
            wanted,
            duration,
            started_at: None,
        }
    }
}

impl Routine for IntakeRoutine {
    fn name(&self) -> &'static str {
        "Intake"
    }

    fn start(&mut self, _commands: &mut Commands, state: &RobotState) {
        self.started_at = Some(state.timestamp);
    }

    fn update(&mut self, commands: &mut Commands, state: &RobotState) -> bool {
        commands.intake_wanted_state = self.wanted;
        elapsed_since(self.started_at, state) >= self.duration
    }

    fn stop(&mut self, commands: &mut Commands, _state: &RobotState) {
        commands.intake_wanted_state = IntakeState::Stow;
    }
}

/// 保持发射机构状态一段时间，结束后回到 Idle
#[derive(Debug, Clone)]
pub struct ShooterRoutine {
    wanted: ShooterState,
    duration: Duration,
    started_at: Option<Instant>,
}

impl ShooterRoutine {
    pub fn new(wanted: ShooterState, duration: Duration) -> Self {
        Self {
            wanted,
            duration,
            started_at: None,
        }
    }
}

impl Routine for ShooterRoutine {
    fn name(&self) -> &'static str {
        "Shooter"
    }

    fn start(&mut self, commands: &mut Commands, state: &RobotState) {
        self.started_at = Some(state.timestamp);
        if self.wanted == ShooterState::VisionDistance {
            commands.vision_wanted = true;
        }
    }

    fn update(&mut self, commands: &mut Commands, state: &RobotState) -> bool {
        commands.shooter_wanted_state = self.wanted;
        elapsed_since(self.started_at, state) >= self.duration
    }

    fn stop(&mut self, commands: &mut Commands, _state: &RobotState) {
        commands.shooter_wanted_state = ShooterState::Idle;
        if self.wanted == ShooterState::VisionDistance {
            commands.vision_wanted = false;
        }
    }
}

/// 条件满足即结束
///
/// 常与 [`RoutineNode::race`](super::RoutineNode::race) 组合，作为"直到……为止"的终止条件。
pub struct ConditionRoutine {
    predicate: Box<dyn Fn(&RobotState) -> bool>,
}

impl ConditionRoutine {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&RobotState) -> bool + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl Routine for ConditionRoutine {
    fn name(&self) -> &'static str {
        "Condition"
    }

    fn update(&mut self, _commands: &mut Commands, state: &RobotState) -> bool {
        (self.predicate)(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::DriveState;
    use crate::routine::RoutineNode;

    fn state_at(start: Instant, offset_ms: u64, tick: u64) -> RobotState {
        let mut state = RobotState::new();
        state.begin_tick(tick, start + Duration::from_millis(offset_ms));
        state
    }

    #[test]
    fn test_wait_uses_robot_clock() {
        let start = Instant::now();
        let mut commands = Commands::new();
        let mut node = RoutineNode::leaf(WaitRoutine::new(Duration::from_millis(40)));

        assert!(!node.execute(&mut commands, &state_at(start, 0, 1)));
        assert!(!node.execute(&mut commands, &state_at(start, 20, 2)));
        assert!(node.execute(&mut commands, &state_at(start, 40, 3)));
    }

    #[test]
    fn test_set_odometry_requests_reset_once() {
        let mut commands = Commands::new();
        let target = Pose2d::new(1.0, -2.0, 45.0);
        let mut node = RoutineNode::leaf(DriveSetOdometryRoutine::new(target));

        assert!(node.execute(&mut commands, &RobotState::new()));
        assert_eq!(commands.drive_wanted_odometry_pose, Some(target));
    }

    #[test]
    fn test_drive_outputs_returns_to_neutral() {
        let start = Instant::now();
        let mut commands = Commands::new();
        let mut node = RoutineNode::leaf(DriveOutputsRoutine::percent(0.4, Duration::from_millis(20)));

        assert!(!node.execute(&mut commands, &state_at(start, 0, 1)));
        assert_eq!(commands.drive_wanted_state, DriveState::Outputs);
        assert!((commands.drive_wanted_left_output.reference() - 0.4).abs() < 1e-9);

        assert!(node.execute(&mut commands, &state_at(start, 20, 2)));
        assert_eq!(commands.drive_wanted_state, DriveState::Neutral);
    }

    #[test]
    fn test_shooter_vision_distance_toggles_vision() {
        let start = Instant::now();
        let mut commands = Commands::new();
        let mut node = RoutineNode::leaf(ShooterRoutine::new(
            ShooterState::VisionDistance,
            Duration::from_millis(20),
        ));

        node.execute(&mut commands, &state_at(start, 0, 1));
        assert!(commands.vision_wanted);
        assert_eq!(commands.shooter_wanted_state, ShooterState::VisionDistance);

        assert!(node.execute(&mut commands, &state_at(start, 20, 2)));
        assert!(!commands.vision_wanted);
        assert_eq!(commands.shooter_wanted_state, ShooterState::Idle);
    }

    #[test]
    fn test_intake_cancel_stows() {
        let start = Instant::now();
        let mut commands = Commands::new();
        let state = state_at(start, 0, 1);
        let mut node = RoutineNode::leaf(IntakeRoutine::new(
            IntakeState::Intake,
            Duration::from_secs(5),
        ));

        node.execute(&mut commands, &state);
        assert_eq!(commands.intake_wanted_state, IntakeState::Intake);
        node.cancel(&mut commands, &state);
        assert_eq!(commands.intake_wanted_state, IntakeState::Stow);
    }

    #[test]
    fn test_timed_routine_times_out() {
        let start = Instant::now();
        let mut commands = Commands::new();
        let never = ConditionRoutine::new(|_| false);
        let mut node = RoutineNode::leaf(TimedRoutine::new(never, Duration::from_millis(60)));

        assert!(!node.execute(&mut commands, &state_at(start, 0, 1)));
        assert!(!node.execute(&mut commands, &state_at(start, 40, 2)));
        assert!(node.execute(&mut commands, &state_at(start, 60, 3)));
        assert_eq!(node.name(), "Condition");
    }

    #[test]
    fn test_race_with_condition_stops_drive() {
        let start = Instant::now();
        let mut commands = Commands::new();
        let mut node = RoutineNode::race(vec![
            RoutineNode::leaf(DriveOutputsRoutine::percent(0.5, Duration::from_secs(10))),
            RoutineNode::leaf(ConditionRoutine::new(|state| state.drive_left_position >= 1.0)),
        ]);

        let mut state = state_at(start, 0, 1);
        assert!(!node.execute(&mut commands, &state));
        assert_eq!(commands.drive_wanted_state, DriveState::Outputs);

        state.drive_left_position = 1.2;
        assert!(node.execute(&mut commands, &state));
        assert_eq!(commands.drive_wanted_state, DriveState::Neutral);
    }

    #[test]
    fn test_waypoints_collected_by_walk() {
        let node = RoutineNode::sequential(vec![
            RoutineNode::leaf(DriveSetOdometryRoutine::new(Pose2d::new(0.0, 0.0, 0.0))),
            RoutineNode::leaf(DriveOutputsRoutine::percent(0.5, Duration::from_secs(1))),
            RoutineNode::leaf(DriveSetOdometryRoutine::new(Pose2d::new(3.0, 1.0, 90.0))),
        ]);

        let mut waypoints = Vec::new();
        node.walk(&mut |n, _| {
            if let Some(pose) = n.waypoint() {
                waypoints.push(pose);
            }
        });
        assert_eq!(
            waypoints,
            vec![Pose2d::new(0.0, 0.0, 0.0), Pose2d::new(3.0, 1.0, 90.0)]
        );
    }
}
