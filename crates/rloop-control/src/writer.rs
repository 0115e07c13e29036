//! 硬件写入
//!
//! 子系统输出经 [`OutputCache`] 去重后写入硬件。电磁阀额外由
//! [`DebouncedBooleanState`] 跟踪：指令切换后需驻留足够时间才认为机构到位。

use crate::subsystems::Subsystem;
use rloop_driver::{
    ActuatorCommand, ActuatorId, CacheStats, DriverError, HardwareWrite, NeutralMode, OutputCache,
    VisionMode, ids,
};
use rloop_tools::{DebouncedBooleanState, Pose2d};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct HardwareWriter {
    cache: OutputCache,
    solenoids: HashMap<ActuatorId, DebouncedBooleanState>,
    solenoid_dwell: Duration,
}

impl HardwareWriter {
    pub fn new(solenoid_dwell: Duration) -> Self {
        Self {
            cache: OutputCache::new(),
            solenoids: HashMap::new(),
            solenoid_dwell,
        }
    }

    /// 启动时配置所有启用子系统的执行器
    ///
    /// 单个执行器配置失败只记录日志，返回失败个数。
    pub fn configure_hardware<W: HardwareWrite + ?Sized>(
        &mut self,
        hw: &mut W,
        subsystems: &[Box<dyn Subsystem>],
    ) -> usize {
        let mut failures = 0;
        for subsystem in subsystems {
            for &id in subsystem.actuators() {
                match hw.configure(id) {
                    Ok(()) => debug!("Configured {}", id),
                    Err(e) => {
                        error!("Failed to configure {}: {}", id, e);
                        failures += 1;
                    },
                }
            }
        }
        self.cache.clear();
        failures
    }

    /// 写入所有子系统的当前输出，返回实际写入次数
    pub fn write_hardware<W: HardwareWrite + ?Sized>(
        &mut self,
        hw: &mut W,
        subsystems: &[Box<dyn Subsystem>],
        now: Instant,
    ) -> usize {
        let mut writes = 0;
        for subsystem in subsystems {
            for (id, command) in subsystem.outputs() {
                if let ActuatorCommand::Solenoid(extend) = command {
                    let dwell = self.solenoid_dwell;
                    self.solenoids
                        .entry(id)
                        .or_insert_with(|| DebouncedBooleanState::new(dwell, false))
                        .set_at(extend, now);
                }
                if self.cache.apply(hw, id, &command) {
                    writes += 1;
                }
            }
        }
        writes
    }

    /// 电磁阀机构是否已稳定伸出
    pub fn is_solenoid_extended(&self, id: ActuatorId) -> bool {
        self.solenoids
            .get(&id)
            .is_some_and(DebouncedBooleanState::is_extended)
    }

    pub fn set_drive_neutral_mode<W: HardwareWrite + ?Sized>(&mut self, hw: &mut W, mode: NeutralMode) {
        for id in ids::DRIVE_MOTORS {
            if let Err(e) = hw.set_neutral_mode(id, mode) {
                warn!("Failed to set {} neutral mode to {:?}: {}", id, mode, e);
            }
        }
        debug!("Drive neutral mode: {:?}", mode);
    }

    /// 按目标位姿重写底盘传感器：航向 = 目标航向，轮位移清零
    ///
    /// 每一项都会尝试，失败不会跳过后续项，返回第一个错误。部分失败时硬件读数
    /// 处于混合状态，调用方必须重新读取传感器再复位里程计。
    /// 位置类闭环目标的参考点随之改变，底盘执行器的缓存基线被丢弃。
    pub fn reset_drive_sensors<W: HardwareWrite + ?Sized>(
        &mut self,
        hw: &mut W,
        pose: Pose2d,
    ) -> Result<(), DriverError> {
        let mut result = hw.set_heading(pose.heading_degrees);
        for id in ids::DRIVE_MOTORS {
            let zeroed = hw.set_sensor_position(id, 0.0);
            self.cache.invalidate(id);
            if result.is_ok() {
                result = zeroed;
            }
        }
        if result.is_ok() {
            info!("Drive sensors reset: heading={:.1}°", pose.heading_degrees);
        }
        result
    }

    pub fn update_vision<W: HardwareWrite + ?Sized>(&mut self, hw: &mut W, wanted: bool, pipeline: u8) {
        let mode = if wanted {
            VisionMode::Vision
        } else {
            VisionMode::Driver
        };
        hw.set_vision(mode, pipeline);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn last_applied(&self, id: ActuatorId) -> Option<&ActuatorCommand> {
        self.cache.last_applied(id)
    }
}
