//! 周期性服务
//!
//! 服务在控制阶段之后、同一线程内同步执行。跨线程的生产者只能通过
//! [`ExternalCommandSender`] 投递指令，由 [`CommandReceiverService`] 每周期排空一次。

use crate::commands::{Commands, IntakeState, ShooterState};
use crate::config::RobotConfig;
use crate::error::ControlError;
use crate::routine::{DriveOutputsRoutine, RoutineNode};
use crate::state::RobotState;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use rloop_driver::ControllerOutput;
use rloop_tools::Pose2d;
use std::time::Duration;
use tracing::{debug, info};

/// 所有已知服务的配置名
pub const SERVICE_NAMES: [&str; 2] = [CommandReceiverService::NAME, StatusLogService::NAME];

/// 周期性服务接口
pub trait RobotService {
    /// 配置名
    fn name(&self) -> &'static str;

    /// 启动时调用一次
    fn start(&mut self) {}

    /// 每周期调用一次（控制阶段之后）
    fn update(&mut self, state: &RobotState, commands: &mut Commands);
}

/// 外部指令
///
/// 只携带数据（`Send`），例程在控制线程内构造。
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalCommand {
    /// 以左右开环占空比行驶一段时间
    DriveFor {
        left: f64,
        right: f64,
        duration: Duration,
    },
    SetIntake(IntakeState),
    SetShooter(ShooterState),
    SetVision { enabled: bool, pipeline: u8 },
    SetCompression(bool),
    ResetOdometry(Pose2d),
    /// 取消所有正在运行的例程
    ClearRoutines,
}

/// 外部指令发送端（可克隆，可跨线程）
#[derive(Debug, Clone)]
pub struct ExternalCommandSender {
    tx: Sender<ExternalCommand>,
}

impl ExternalCommandSender {
    /// 非阻塞投递
    pub fn send(&self, command: ExternalCommand) -> Result<(), ControlError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => ControlError::ChannelFull,
            TrySendError::Disconnected(_) => ControlError::ChannelClosed,
        })
    }

    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// 创建指令队列
pub fn command_channel(capacity: usize) -> (ExternalCommandSender, CommandReceiverService) {
    let (tx, rx) = bounded(capacity);
    (
        ExternalCommandSender { tx },
        CommandReceiverService {
            rx,
            received: 0,
            ignored: 0,
        },
    )
}

/// 外部指令接收服务
#[derive(Debug)]
pub struct CommandReceiverService {
    rx: Receiver<ExternalCommand>,
    received: u64,
    ignored: u64,
}

impl CommandReceiverService {
    pub const NAME: &'static str = "command_receiver";

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn ignored(&self) -> u64 {
        self.ignored
    }

    fn apply(command: ExternalCommand, commands: &mut Commands) {
        match command {
            ExternalCommand::DriveFor {
                left,
                right,
                duration,
            } => {
                let routine = DriveOutputsRoutine::new(
                    ControllerOutput::percent_output(left),
                    ControllerOutput::percent_output(right),
                    duration,
                );
                commands.add_wanted_routine(RoutineNode::leaf(routine));
            },
            ExternalCommand::SetIntake(state) => commands.intake_wanted_state = state,
            ExternalCommand::SetShooter(state) => commands.shooter_wanted_state = state,
            ExternalCommand::SetVision { enabled, pipeline } => {
                commands.vision_wanted = enabled;
                commands.vision_wanted_pipeline = pipeline;
            },
            ExternalCommand::SetCompression(on) => commands.wanted_compression = on,
            ExternalCommand::ResetOdometry(pose) => {
                commands.drive_wanted_odometry_pose = Some(pose);
            },
            ExternalCommand::ClearRoutines => commands.should_clear_current_routines = true,
        }
    }
}

impl RobotService for CommandReceiverService {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, state: &RobotState, commands: &mut Commands) {
        // 只处理本周期开始时已在队列中的指令
        let pending = self.rx.len();
        for command in self.rx.try_iter().take(pending) {
            self.received += 1;
            if !state.game_period.is_enabled() {
                self.ignored += 1;
                debug!("Ignoring external command while disabled: {:?}", command);
                continue;
            }
            debug!("External command: {:?}", command);
            Self::apply(command, commands);
        }
    }
}

/// 周期性状态日志
#[derive(Debug)]
pub struct StatusLogService {
    every_ticks: u64,
}

impl StatusLogService {
    pub const NAME: &'static str = "status_log";

    pub fn new(every_ticks: u64) -> Self {
        Self {
            every_ticks: every_ticks.max(1),
        }
    }
}

impl RobotService for StatusLogService {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, state: &RobotState, _commands: &mut Commands) {
        if state.tick % self.every_ticks != 0 {
            return;
        }
        let pose = state.drive_pose();
        info!(
            "[{}] tick={} pose=({:.2}, {:.2}, {:.1}°) gyro_ready={} intake_extended={} vision={:?}",
            state.game_period,
            state.tick,
            pose.x,
            pose.y,
            pose.heading_degrees,
            state.drive_is_gyro_ready,
            state.intake_is_extended,
            state.vision_distance_inches
        );
    }
}

/// 按配置顺序构造启用的服务
///
/// 未启用 `command_receiver` 时接收端被丢弃，发送端随后返回 [`ControlError::ChannelClosed`]。
pub fn build_services(
    config: &RobotConfig,
    receiver: CommandReceiverService,
) -> Result<Vec<Box<dyn RobotService>>, ControlError> {
    let mut receiver = Some(receiver);
    let status_every = (1000 / config.loop_period_ms.max(1)).max(1);

    let mut services: Vec<Box<dyn RobotService>> = Vec::new();
    for name in &config.enabled_services {
        match name.as_str() {
            CommandReceiverService::NAME => {
                if let Some(receiver) = receiver.take() {
                    services.push(Box::new(receiver));
                }
            },
            StatusLogService::NAME => services.push(Box::new(StatusLogService::new(status_every))),
            other => return Err(ControlError::UnknownService(other.to_string())),
        }
    }
    Ok(services)
}
