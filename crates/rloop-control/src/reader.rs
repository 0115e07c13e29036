//! 硬件读取：传感器 → RobotState，并轮询粘滞故障

use crate::probe::LoopProbe;
use crate::state::RobotState;
use crate::subsystems::{Drive, Intake, Subsystem};
use crate::writer::HardwareWriter;
use rloop_driver::{DriveSide, Hardware, ids};
use tracing::{error, warn};

#[derive(Debug, Default)]
pub struct HardwareReader {
    faults_cleared: u64,
}

impl HardwareReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取本周期的外部状态
    ///
    /// 只读取启用子系统对应的传感器。航向传感器未就绪时保留上一周期的航向。
    /// 底盘启用时在读完轮位移后推进里程计（每周期至多一次）。
    pub fn read_state<H: Hardware + ?Sized>(
        &mut self,
        hw: &mut H,
        subsystems: &[Box<dyn Subsystem>],
        writer: &HardwareWriter,
        check_faults: bool,
        state: &mut RobotState,
        probe: &mut LoopProbe,
    ) {
        state.game_message = hw.game_message();
        state.vision_distance_inches = hw.vision_distance_inches();
        probe.checkpoint("read_game");

        let enabled = |name: &str| subsystems.iter().any(|s| s.name() == name);

        if enabled(Drive::NAME) {
            Self::read_drive(&*hw, state);
            probe.checkpoint("read_drive");
        }
        if enabled(Intake::NAME) {
            state.intake_is_extended = writer.is_solenoid_extended(ids::INTAKE_SOLENOID);
        }

        if check_faults {
            self.check_faults(hw, subsystems);
            probe.checkpoint("check_faults");
        }
    }

    fn read_drive<H: Hardware + ?Sized>(hw: &H, state: &mut RobotState) {
        Self::read_drive_sensors(hw, state);
        state.update_odometry();
    }

    /// 只读取底盘传感器，不推进里程计
    pub(crate) fn read_drive_sensors<H: Hardware + ?Sized>(hw: &H, state: &mut RobotState) {
        let heading = hw.heading();
        state.drive_is_gyro_ready = heading.ready;
        if heading.ready {
            state.drive_yaw_degrees = heading.yaw_degrees;
            state.drive_yaw_angular_velocity_degrees = heading.yaw_rate_degrees;
        }

        let left = hw.wheel(DriveSide::Left);
        let right = hw.wheel(DriveSide::Right);
        state.drive_left_position = left.position;
        state.drive_left_velocity = left.velocity;
        state.drive_right_position = right.position;
        state.drive_right_velocity = right.velocity;
    }

    /// 查询所有启用执行器的粘滞故障，有故障则记录并清除
    fn check_faults<H: Hardware + ?Sized>(&mut self, hw: &mut H, subsystems: &[Box<dyn Subsystem>]) {
        for subsystem in subsystems {
            for &id in subsystem.actuators() {
                match hw.sticky_faults(id) {
                    Ok(faults) if faults.has_any_fault() => {
                        error!("{} faults: {}", id, faults);
                        match hw.clear_sticky_faults(id) {
                            Ok(()) => self.faults_cleared += 1,
                            Err(e) => warn!("{}: failed to clear sticky faults: {}", id, e),
                        }
                    },
                    Ok(_) => {},
                    Err(e) => warn!("{}: sticky fault query failed: {}", id, e),
                }
            }
        }
    }

    pub fn faults_cleared(&self) -> u64 {
        self.faults_cleared
    }
}
