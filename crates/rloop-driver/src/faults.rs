//! 粘滞故障
//!
//! 控制器上报的故障标志会一直保持，直到显式清除。

use std::fmt;

/// 控制器粘滞故障标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StickyFaults {
    pub under_voltage: bool,
    pub forward_limit_switch: bool,
    pub reverse_limit_switch: bool,
    pub hardware_failure: bool,
    pub reset_during_enable: bool,
    pub sensor_overflow: bool,
    pub sensor_out_of_phase: bool,
    pub remote_loss_of_signal: bool,
}

impl StickyFaults {
    fn flags(&self) -> [(&'static str, bool); 8] {
        [
            ("UnderVoltage", self.under_voltage),
            ("ForwardLimitSwitch", self.forward_limit_switch),
            ("ReverseLimitSwitch", self.reverse_limit_switch),
            ("HardwareFailure", self.hardware_failure),
            ("ResetDuringEnable", self.reset_during_enable),
            ("SensorOverflow", self.sensor_overflow),
            ("SensorOutOfPhase", self.sensor_out_of_phase),
            ("RemoteLossOfSignal", self.remote_loss_of_signal),
        ]
    }

    pub fn has_any_fault(&self) -> bool {
        self.flags().iter().any(|(_, set)| *set)
    }
}

impl fmt::Display for StickyFaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, set) in self.flags() {
            if set {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}
