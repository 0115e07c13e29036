//! 操作员输入 → Commands
//!
//! 按钮按边沿触发（按下 / 松开），避免每周期覆盖例程写入的字段。
//! 摇杆输入每周期写入；当例程正在直接驱动底盘而操作员推动摇杆时，接管底盘并取消例程。

use crate::commands::{Commands, DriveState, IntakeState, ShooterState};
use crate::state::RobotState;
use rloop_driver::OperatorInputs;
use tracing::info;

/// 无视觉目标时手柄振动的周期数
const RUMBLE_TICKS: u32 = 25;

/// 摇杆接管阈值
const TAKEOVER_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct OperatorInterface {
    previous: OperatorInputs,
    current: OperatorInputs,
    rumble_ticks_remaining: u32,
}

impl OperatorInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将本周期的操作员输入映射到 Commands（仅 Teleop / Test）
    pub fn update_commands(
        &mut self,
        inputs: OperatorInputs,
        commands: &mut Commands,
        state: &RobotState,
    ) {
        self.current = inputs;

        commands.drive_wanted_throttle = inputs.drive_throttle;
        commands.drive_wanted_wheel = inputs.drive_wheel;
        commands.drive_wanted_quick_turn = inputs.drive_quick_turn;

        let sticks_active = inputs.drive_throttle.abs() > TAKEOVER_THRESHOLD
            || inputs.drive_wheel.abs() > TAKEOVER_THRESHOLD;
        if sticks_active && commands.drive_wanted_state != DriveState::Teleop {
            if commands.drive_wanted_state == DriveState::Outputs {
                info!("Operator took over drive, clearing routines");
                commands.should_clear_current_routines = true;
            }
            commands.set_drive_teleop();
        }

        if self.pressed(|i| i.intake_pressed) {
            commands.intake_wanted_state = IntakeState::Intake;
        } else if self.released(|i| i.intake_pressed) {
            commands.intake_wanted_state = IntakeState::Stow;
        }

        if self.pressed(|i| i.shoot_pressed) {
            commands.shooter_wanted_state = ShooterState::VisionDistance;
            commands.vision_wanted = true;
            if state.vision_distance_inches.is_none() {
                commands.wanted_rumble = true;
                self.rumble_ticks_remaining = RUMBLE_TICKS;
            }
        } else if self.released(|i| i.shoot_pressed) {
            commands.shooter_wanted_state = ShooterState::Idle;
            commands.vision_wanted = false;
        }

        if self.pressed(|i| i.vision_pressed) {
            commands.vision_wanted = !commands.vision_wanted;
        }
    }

    /// 每周期末尾调用：锁存本周期输入用于边沿检测，倒计时振动
    pub fn reset_periodic(&mut self, commands: &mut Commands) {
        self.previous = self.current;
        if self.rumble_ticks_remaining > 0 {
            self.rumble_ticks_remaining -= 1;
            if self.rumble_ticks_remaining == 0 {
                commands.wanted_rumble = false;
            }
        }
    }

    /// 阶段切换：Commands 回到安全空闲，清除边沿记忆
    pub fn reset(&mut self, commands: &mut Commands) {
        commands.reset_to_idle();
        *self = Self::default();
    }

    fn pressed(&self, button: impl Fn(&OperatorInputs) -> bool) -> bool {
        button(&self.current) && !button(&self.previous)
    }

    fn released(&self, button: impl Fn(&OperatorInputs) -> bool) -> bool {
        !button(&self.current) && button(&self.previous)
    }
}
