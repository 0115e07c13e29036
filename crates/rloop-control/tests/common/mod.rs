//! 集成测试公共设施：以合成时钟驱动 `Robot<MockHardware>`

#![allow(dead_code)]

use rloop_control::auto::NoAuto;
use rloop_control::{AutoSelector, ConfigStore, LoopReport, Robot, RobotConfig};
use rloop_driver::{
    ActuatorCommand, ActuatorId, ControllerOutput, DriverStationState, GameMode, MockHardware,
    OperatorInputs, OutputMode,
};
use std::time::{Duration, Instant};

pub const PERIOD: Duration = Duration::from_millis(20);

pub struct Harness {
    pub robot: Robot<MockHardware>,
    pub store: ConfigStore,
    pub now: Instant,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RobotConfig::default())
    }

    pub fn with_config(config: RobotConfig) -> Self {
        Self::with_auto(config, Box::new(NoAuto))
    }

    pub fn with_auto(config: RobotConfig, auto: Box<dyn AutoSelector>) -> Self {
        let store = ConfigStore::new(config);
        let robot = Robot::new(MockHardware::new(), store.clone(), auto)
            .expect("robot setup should succeed");
        Self {
            robot,
            store,
            now: Instant::now(),
        }
    }

    pub fn enable(&mut self, mode: GameMode) {
        self.robot
            .hardware_mut()
            .set_driver_station(DriverStationState::enabled(mode));
    }

    pub fn disable(&mut self) {
        self.robot
            .hardware_mut()
            .set_driver_station(DriverStationState::disabled());
    }

    pub fn set_inputs(&mut self, inputs: OperatorInputs) {
        self.robot.hardware_mut().set_operator_inputs(inputs);
    }

    /// 执行一个周期，随后把模拟硬件推进一个周期
    pub fn tick(&mut self) -> LoopReport {
        let report = self.robot.tick_at(self.now);
        self.robot.hardware_mut().step(PERIOD);
        self.now += PERIOD;
        report
    }

    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn motor(&self, id: ActuatorId) -> Option<ControllerOutput> {
        match self.robot.hardware().output(id) {
            Some(ActuatorCommand::Motor(output)) => Some(*output),
            _ => None,
        }
    }

    pub fn motor_is_idle(&self, id: ActuatorId) -> bool {
        self.motor(id)
            .is_some_and(|output| output.mode() == OutputMode::Idle)
    }

    pub fn solenoid(&self, id: ActuatorId) -> Option<bool> {
        match self.robot.hardware().output(id) {
            Some(ActuatorCommand::Solenoid(extended)) => Some(*extended),
            _ => None,
        }
    }
}
