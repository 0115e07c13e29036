//! Mock 硬件
//!
//! 无硬件依赖的确定性模拟：记录所有写入，并提供一个简单的差速底盘运动学模型，
//! 通过 [`MockHardware::step`] 推进时间。用于单元测试、集成测试和 `rloop-sim`。

use crate::actuator::{ActuatorCommand, ActuatorId, NeutralMode, OutputMode, ids};
use crate::error::DriverError;
use crate::faults::StickyFaults;
use crate::hardware::{
    DriveSide, DriverStationState, HardwareRead, HardwareWrite, HeadingReading, OperatorInputs,
    VisionMode, WheelReading,
};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

const MOTORS: [ActuatorId; 4] = [
    ids::DRIVE_LEFT,
    ids::DRIVE_RIGHT,
    ids::INTAKE_ROLLER,
    ids::SHOOTER_FLYWHEEL,
];
const SOLENOIDS: [ActuatorId; 1] = [ids::INTAKE_SOLENOID];

/// 100% 占空比对应的轮速（m/s）
const DEFAULT_MAX_WHEEL_SPEED: f64 = 4.0;
/// 轮距（m）
const DEFAULT_TRACK_WIDTH: f64 = 0.6;

/// Mock 硬件
#[derive(Debug, Clone)]
pub struct MockHardware {
    driver_station: DriverStationState,
    game_message: String,
    heading: HeadingReading,
    left: WheelReading,
    right: WheelReading,
    vision_distance_inches: Option<f64>,
    operator_inputs: OperatorInputs,

    outputs: HashMap<ActuatorId, ActuatorCommand>,
    write_counts: HashMap<ActuatorId, u64>,
    failing: HashSet<ActuatorId>,
    disconnected: HashSet<ActuatorId>,
    faults: HashMap<ActuatorId, StickyFaults>,
    fault_clears: HashMap<ActuatorId, u64>,
    neutral_modes: HashMap<ActuatorId, NeutralMode>,
    configured: Vec<ActuatorId>,
    compressor: bool,
    vision: (VisionMode, u8),
    rumble: bool,
    last_error: Option<DriverError>,

    max_wheel_speed: f64,
    track_width: f64,
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            driver_station: DriverStationState::disabled(),
            game_message: String::new(),
            heading: HeadingReading {
                ready: true,
                ..Default::default()
            },
            left: WheelReading::default(),
            right: WheelReading::default(),
            vision_distance_inches: None,
            operator_inputs: OperatorInputs::default(),
            outputs: HashMap::new(),
            write_counts: HashMap::new(),
            failing: HashSet::new(),
            disconnected: HashSet::new(),
            faults: HashMap::new(),
            fault_clears: HashMap::new(),
            neutral_modes: HashMap::new(),
            configured: Vec::new(),
            compressor: false,
            vision: (VisionMode::Driver, 0),
            rumble: false,
            last_error: None,
            max_wheel_speed: DEFAULT_MAX_WHEEL_SPEED,
            track_width: DEFAULT_TRACK_WIDTH,
        }
    }

    // ==================== 场景注入 ====================

    pub fn set_driver_station(&mut self, state: DriverStationState) {
        self.driver_station = state;
    }

    pub fn set_game_message(&mut self, message: impl Into<String>) {
        self.game_message = message.into();
    }

    /// 模拟航向传感器就绪 / 未就绪
    pub fn set_heading_ready(&mut self, ready: bool) {
        self.heading.ready = ready;
    }

    pub fn set_operator_inputs(&mut self, inputs: OperatorInputs) {
        self.operator_inputs = inputs;
    }

    pub fn set_vision_distance(&mut self, inches: Option<f64>) {
        self.vision_distance_inches = inches;
    }

    /// 注入粘滞故障
    pub fn inject_fault(&mut self, id: ActuatorId, faults: StickyFaults) {
        self.faults.insert(id, faults);
    }

    /// 让某个执行器的写入失败 / 恢复
    pub fn fail_writes(&mut self, id: ActuatorId, failing: bool) {
        if failing {
            self.failing.insert(id);
        } else {
            self.failing.remove(&id);
        }
    }

    /// 模拟控制器掉线：除读数外的所有操作返回 [`DriverError::Disconnected`]
    pub fn set_connected(&mut self, id: ActuatorId, connected: bool) {
        if connected {
            self.disconnected.remove(&id);
        } else {
            self.disconnected.insert(id);
        }
    }

    /// 直接设置车轮读数（模拟外部移动）
    pub fn set_wheel(&mut self, side: DriveSide, reading: WheelReading) {
        match side {
            DriveSide::Left => self.left = reading,
            DriveSide::Right => self.right = reading,
        }
    }

    // ==================== 观察 ====================

    pub fn output(&self, id: ActuatorId) -> Option<&ActuatorCommand> {
        self.outputs.get(&id)
    }

    pub fn write_count(&self, id: ActuatorId) -> u64 {
        self.write_counts.get(&id).copied().unwrap_or(0)
    }

    pub fn total_writes(&self) -> u64 {
        self.write_counts.values().sum()
    }

    pub fn neutral_mode(&self, id: ActuatorId) -> Option<NeutralMode> {
        self.neutral_modes.get(&id).copied()
    }

    pub fn fault_clear_count(&self, id: ActuatorId) -> u64 {
        self.fault_clears.get(&id).copied().unwrap_or(0)
    }

    pub fn configured(&self) -> &[ActuatorId] {
        &self.configured
    }

    pub fn compressor_on(&self) -> bool {
        self.compressor
    }

    pub fn vision(&self) -> (VisionMode, u8) {
        self.vision
    }

    pub fn rumble_on(&self) -> bool {
        self.rumble
    }

    pub fn last_error(&self) -> Option<&DriverError> {
        self.last_error.as_ref()
    }

    // ==================== 运动学 ====================

    /// 按当前驱动输出推进模拟时间
    pub fn step(&mut self, dt: Duration) {
        let dt_secs = dt.as_secs_f64();
        let left_velocity = self.wheel_velocity(ids::DRIVE_LEFT, self.left.position, dt_secs);
        let right_velocity = self.wheel_velocity(ids::DRIVE_RIGHT, self.right.position, dt_secs);

        self.left.velocity = left_velocity;
        self.right.velocity = right_velocity;
        self.left.position += left_velocity * dt_secs;
        self.right.position += right_velocity * dt_secs;

        let yaw_rate = ((right_velocity - left_velocity) / self.track_width).to_degrees();
        self.heading.yaw_rate_degrees = yaw_rate;
        self.heading.yaw_degrees += yaw_rate * dt_secs;
    }

    fn wheel_velocity(&self, id: ActuatorId, position: f64, dt_secs: f64) -> f64 {
        let Some(ActuatorCommand::Motor(output)) = self.outputs.get(&id) else {
            return 0.0;
        };
        let velocity = match output.mode() {
            OutputMode::Idle => 0.0,
            OutputMode::PercentOutput => output.reference() * self.max_wheel_speed,
            OutputMode::Velocity | OutputMode::ProfiledVelocity => output.reference(),
            OutputMode::Position | OutputMode::ProfiledPosition if dt_secs > 0.0 => {
                (output.reference() - position) / dt_secs
            },
            OutputMode::Position | OutputMode::ProfiledPosition => 0.0,
        };
        velocity.clamp(-self.max_wheel_speed, self.max_wheel_speed)
    }

    fn check_known(&self, id: ActuatorId) -> Result<(), DriverError> {
        if self.disconnected.contains(&id) {
            return Err(DriverError::Disconnected(id));
        }
        if MOTORS.contains(&id) || SOLENOIDS.contains(&id) {
            Ok(())
        } else {
            Err(DriverError::UnknownActuator(id))
        }
    }

    fn check_motor(&self, id: ActuatorId) -> Result<(), DriverError> {
        if self.disconnected.contains(&id) {
            return Err(DriverError::Disconnected(id));
        }
        if MOTORS.contains(&id) {
            Ok(())
        } else {
            Err(DriverError::UnknownActuator(id))
        }
    }

    fn record(&mut self, result: Result<(), DriverError>) -> Result<(), DriverError> {
        if let Err(e) = &result {
            self.last_error = Some(e.clone());
        }
        result
    }
}

impl HardwareRead for MockHardware {
    fn driver_station(&self) -> DriverStationState {
        self.driver_station
    }

    fn game_message(&self) -> String {
        self.game_message.clone()
    }

    fn heading(&self) -> HeadingReading {
        self.heading
    }

    fn wheel(&self, side: DriveSide) -> WheelReading {
        match side {
            DriveSide::Left => self.left,
            DriveSide::Right => self.right,
        }
    }

    fn vision_distance_inches(&self) -> Option<f64> {
        self.vision_distance_inches
    }

    fn operator_inputs(&self) -> OperatorInputs {
        self.operator_inputs
    }

    fn sticky_faults(&self, id: ActuatorId) -> Result<StickyFaults, DriverError> {
        self.check_known(id)?;
        Ok(self.faults.get(&id).copied().unwrap_or_default())
    }
}

impl HardwareWrite for MockHardware {
    fn configure(&mut self, id: ActuatorId) -> Result<(), DriverError> {
        let result = self.check_known(id);
        if result.is_ok() && !self.configured.contains(&id) {
            self.configured.push(id);
        }
        self.record(result)
    }

    fn write(&mut self, id: ActuatorId, command: &ActuatorCommand) -> Result<(), DriverError> {
        let result = if self.disconnected.contains(&id) {
            Err(DriverError::Disconnected(id))
        } else if self.failing.contains(&id) {
            Err(DriverError::WriteFailed {
                id,
                reason: "injected failure".to_string(),
            })
        } else {
            match command {
                ActuatorCommand::Motor(_) if !MOTORS.contains(&id) => self.check_known(id).and(
                    Err(DriverError::UnsupportedCommand {
                        id,
                        kind: command.kind(),
                    }),
                ),
                ActuatorCommand::Solenoid(_) if !SOLENOIDS.contains(&id) => {
                    self.check_known(id).and(Err(DriverError::UnsupportedCommand {
                        id,
                        kind: command.kind(),
                    }))
                },
                _ => Ok(()),
            }
        };

        if result.is_ok() {
            self.outputs.insert(id, *command);
            *self.write_counts.entry(id).or_insert(0) += 1;
        }
        self.record(result)
    }

    fn set_neutral_mode(&mut self, id: ActuatorId, mode: NeutralMode) -> Result<(), DriverError> {
        let result = self.check_motor(id);
        if result.is_ok() {
            self.neutral_modes.insert(id, mode);
        }
        self.record(result)
    }

    fn clear_sticky_faults(&mut self, id: ActuatorId) -> Result<(), DriverError> {
        let result = self.check_known(id);
        if result.is_ok() {
            self.faults.remove(&id);
            *self.fault_clears.entry(id).or_insert(0) += 1;
        }
        self.record(result)
    }

    fn set_sensor_position(&mut self, id: ActuatorId, position: f64) -> Result<(), DriverError> {
        let result = match id {
            _ if self.disconnected.contains(&id) => Err(DriverError::Disconnected(id)),
            ids::DRIVE_LEFT => {
                self.left.position = position;
                Ok(())
            },
            ids::DRIVE_RIGHT => {
                self.right.position = position;
                Ok(())
            },
            other => self.check_motor(other),
        };
        self.record(result)
    }

    fn set_heading(&mut self, degrees: f64) -> Result<(), DriverError> {
        self.heading.yaw_degrees = degrees;
        Ok(())
    }

    fn set_compressor(&mut self, on: bool) {
        self.compressor = on;
    }

    fn set_vision(&mut self, mode: VisionMode, pipeline: u8) {
        self.vision = (mode, pipeline);
    }

    fn set_rumble(&mut self, on: bool) {
        self.rumble = on;
    }
}
