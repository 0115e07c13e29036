//! 固定周期控制循环
//!
//! # 单周期顺序
//!
//! ```text
//! 配置变更(仅禁用时) → 阶段检测 → 读取 → [操作员] → 例程 → 位姿复位 → 子系统 → 写入 → 服务
//! ```
//!
//! 每个阶段结束时在本周期的 [`LoopProbe`] 上记录检查点；周期末尾超时只记录日志。
//!
//! # 阶段切换
//!
//! 取消所有例程 → Commands 回到安全空闲 → 推送空闲输出；
//! 进入 Disabled 时额外关闭振动并按配置设置底盘滑行 / 刹车，其余阶段刹车。
//!
//! # 线程模型
//!
//! `Robot` 独占 [`RobotState`] 与 [`Commands`]，只在控制线程上使用。
//! 其他线程通过 [`ExternalCommandSender`] 或 [`ConfigStore`] 与之交互，
//! 二者都经队列转交，每周期排空一次。

use crate::auto::AutoSelector;
use crate::commands::Commands;
use crate::config::{ConfigStore, ConfigSubscription, RobotConfig};
use crate::error::ControlError;
use crate::operator::OperatorInterface;
use crate::probe::{LoopProbe, LoopReport, LoopStatistics};
use crate::reader::HardwareReader;
use crate::routine::RoutineManager;
use crate::service::{ExternalCommandSender, RobotService, build_services, command_channel};
use crate::state::{AtomicGamePeriod, GamePeriod, RobotState};
use crate::subsystems::{Drive, Subsystem, build_subsystems};
use crate::writer::HardwareWriter;
use crossbeam_channel::{Receiver, Sender, bounded};
use rloop_driver::{CacheStats, Hardware, NeutralMode};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 配置变更通知只是唤醒信号，内容总是从存储读取
const CONFIG_SIGNAL_CAPACITY: usize = 1;

/// 机器人控制循环
pub struct Robot<H: Hardware> {
    hardware: H,
    config_store: ConfigStore,
    config: Arc<RobotConfig>,

    state: RobotState,
    commands: Commands,
    routines: RoutineManager,
    operator: OperatorInterface,
    reader: HardwareReader,
    writer: HardwareWriter,
    subsystems: Vec<Box<dyn Subsystem>>,
    services: Vec<Box<dyn RobotService>>,
    auto: Box<dyn AutoSelector>,

    shared_period: Arc<AtomicGamePeriod>,
    config_rx: Receiver<()>,
    config_subscription: Option<ConfigSubscription>,
    command_sender: ExternalCommandSender,

    stats: LoopStatistics,
    tick: u64,
    last_report: Option<LoopReport>,
}

impl<H: Hardware> Robot<H> {
    /// 按配置存储中的当前配置完成启动
    ///
    /// 构造子系统与服务、配置执行器、启动服务、订阅配置变更，并以 Disabled 阶段开始。
    pub fn new(
        mut hardware: H,
        config_store: ConfigStore,
        auto: Box<dyn AutoSelector>,
    ) -> Result<Self, ControlError> {
        let config = config_store.current();
        config.validate()?;

        let subsystems = build_subsystems(&config)?;
        let (command_sender, receiver) = command_channel(config.command_queue_capacity);
        let mut services = build_services(&config, receiver)?;

        let mut writer = HardwareWriter::new(config.solenoid_dwell());
        let failures = writer.configure_hardware(&mut hardware, &subsystems);
        if failures > 0 {
            warn!("{} actuator(s) failed to configure", failures);
        }

        for service in services.iter_mut() {
            service.start();
        }

        let shared_period = Arc::new(AtomicGamePeriod::new(GamePeriod::Disabled));
        let (config_tx, config_rx) = bounded(CONFIG_SIGNAL_CAPACITY);
        let config_subscription =
            subscribe_config_changes(&config_store, Arc::clone(&shared_period), config_tx);

        info!("{}", setup_summary(&subsystems, &services, auto.name()));

        let mut robot = Self {
            hardware,
            config_store,
            stats: LoopStatistics::new(config.overrun_warning_threshold),
            config,
            state: RobotState::new(),
            commands: Commands::new(),
            routines: RoutineManager::new(),
            operator: OperatorInterface::new(),
            reader: HardwareReader::new(),
            writer,
            subsystems,
            services,
            auto,
            shared_period,
            config_rx,
            config_subscription: Some(config_subscription),
            command_sender,
            tick: 0,
            last_report: None,
        };
        robot.update_drive_neutral_mode(robot.config.coast_drive_when_disabled);
        Ok(robot)
    }

    /// 以当前时刻执行一个周期
    pub fn tick(&mut self) -> LoopReport {
        self.tick_at(Instant::now())
    }

    /// 以给定时刻作为本周期时间戳执行一个周期
    ///
    /// 时间相关的例程以 `RobotState::timestamp` 为时钟，仿真可以按固定步长推进。
    pub fn tick_at(&mut self, now: Instant) -> LoopReport {
        self.tick += 1;
        self.state.begin_tick(self.tick, now);
        let mut probe = LoopProbe::start(self.config.period());

        self.apply_pending_config();
        let wanted = GamePeriod::from(self.hardware.driver_station());
        if wanted != self.state.game_period {
            self.enter_period(wanted, &mut probe);
        }
        probe.checkpoint("mode");

        self.reader.read_state(
            &mut self.hardware,
            &self.subsystems,
            &self.writer,
            self.config.check_faults,
            &mut self.state,
            &mut probe,
        );

        match self.state.game_period {
            GamePeriod::Disabled => {
                self.writer.update_vision(
                    &mut self.hardware,
                    self.config.enable_vision_when_disabled,
                    self.config.vision_pipeline_when_disabled,
                );
                probe.checkpoint("vision");
            },
            period => {
                if matches!(period, GamePeriod::Teleop | GamePeriod::Test) {
                    let inputs = self.hardware.operator_inputs();
                    self.operator
                        .update_commands(inputs, &mut self.commands, &self.state);
                    probe.checkpoint("operator");
                }
                self.routines.update(&mut self.commands, &self.state);
                probe.checkpoint("routines");
                self.update_subsystems_and_apply_outputs(&mut probe);
            },
        }

        for service in self.services.iter_mut() {
            service.update(&self.state, &mut self.commands);
        }
        self.operator.reset_periodic(&mut self.commands);
        probe.checkpoint("services");

        let report = probe.finish();
        self.stats.record(&report);
        self.last_report = Some(report.clone());
        report
    }

    /// 切换比赛阶段
    ///
    /// 通常由 `tick` 根据驱动站状态自动触发；也可直接调用以强制切换。
    pub fn transition_to(&mut self, period: GamePeriod) {
        let mut probe = LoopProbe::start(self.config.period());
        self.enter_period(period, &mut probe);
    }

    /// 切换阶段，推送空闲输出的检查点记录在 `probe` 上
    fn enter_period(&mut self, period: GamePeriod, probe: &mut LoopProbe) {
        info!("Game period: {} -> {}", self.state.game_period, period);
        self.state.game_period = period;
        self.shared_period.set(period, Ordering::Release);

        self.routines
            .clear_running_routines(&mut self.commands, &self.state);
        // 例程的 stop 可能写入 Commands，清空后再复位
        self.operator.reset(&mut self.commands);
        self.update_subsystems_and_apply_outputs(probe);

        match period {
            GamePeriod::Disabled => {
                self.hardware.set_rumble(false);
                self.sync_config_from_store();
                self.update_drive_neutral_mode(self.config.coast_drive_when_disabled);
            },
            GamePeriod::Auto => {
                self.update_drive_neutral_mode(false);
                info!("Running auto {}", self.auto.name());
                let routine = self.auto.routine(&self.state);
                self.commands.add_wanted_routine(routine);
            },
            GamePeriod::Teleop => {
                self.update_drive_neutral_mode(false);
                self.commands.set_drive_teleop();
            },
            GamePeriod::Test => self.update_drive_neutral_mode(false),
        }
    }

    /// 停止：切回 Disabled（取消例程、推送空闲输出）并注销配置订阅
    pub fn shutdown(&mut self) {
        info!(
            "Shutting down after {} ticks ({} overruns)",
            self.stats.ticks, self.stats.overruns
        );
        self.transition_to(GamePeriod::Disabled);
        self.config_subscription = None;
    }

    pub fn into_hardware(self) -> H {
        self.hardware
    }

    fn update_subsystems_and_apply_outputs(&mut self, probe: &mut LoopProbe) {
        self.reset_odometry_if_wanted();

        for subsystem in self.subsystems.iter_mut() {
            subsystem.update(&self.commands, &self.state);
            probe.checkpoint(subsystem.name());
        }

        self.writer
            .write_hardware(&mut self.hardware, &self.subsystems, self.state.timestamp);
        self.writer.update_vision(
            &mut self.hardware,
            self.commands.vision_wanted,
            self.commands.vision_wanted_pipeline,
        );
        self.hardware.set_compressor(self.commands.wanted_compression);
        self.hardware.set_rumble(self.commands.wanted_rumble);
        probe.checkpoint("write");
    }

    /// 消费一次性位姿复位请求（每周期至多一次）
    ///
    /// 重写传感器后重新读取读数，再以实际读数为参考点复位里程计；
    /// 即使部分重写失败，下一周期的增量也只反映真实运动。
    fn reset_odometry_if_wanted(&mut self) {
        let Some(pose) = self.commands.drive_wanted_odometry_pose.take() else {
            return;
        };

        if self.has_subsystem(Drive::NAME) {
            if let Err(e) = self.writer.reset_drive_sensors(&mut self.hardware, pose) {
                warn!("Failed to re-zero drive sensors: {}", e);
            }
            HardwareReader::read_drive_sensors(&self.hardware, &mut self.state);
        }
        self.state.reset_odometry(pose);
        info!(
            "Odometry reset to ({:.2}, {:.2}, {:.1}°)",
            pose.x, pose.y, pose.heading_degrees
        );
    }

    fn update_drive_neutral_mode(&mut self, coast: bool) {
        if !self.has_subsystem(Drive::NAME) {
            return;
        }
        let mode = if coast {
            NeutralMode::Coast
        } else {
            NeutralMode::Brake
        };
        self.writer.set_drive_neutral_mode(&mut self.hardware, mode);
    }

    fn apply_pending_config(&mut self) {
        let signalled = self.config_rx.try_iter().count() > 0;
        if !signalled {
            return;
        }
        if self.state.game_period.is_enabled() {
            debug!("Config change signalled while enabled, deferred until disabled");
            return;
        }
        self.sync_config_from_store();
    }

    fn sync_config_from_store(&mut self) {
        let current = self.config_store.current();
        if *current != *self.config {
            self.apply_config((*current).clone());
        }
    }

    fn apply_config(&mut self, config: RobotConfig) {
        if config == *self.config {
            return;
        }
        if config.enabled_subsystems != self.config.enabled_subsystems
            || config.enabled_services != self.config.enabled_services
        {
            warn!("Enabled subsystems / services are fixed at setup; restart to change them");
        }
        self.stats
            .set_warning_threshold(config.overrun_warning_threshold);
        self.config = Arc::new(config);
        self.update_drive_neutral_mode(self.config.coast_drive_when_disabled);
        info!("Applied config change");
    }

    // ==================== 访问器 ====================

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// 在周期之间修改期望（例如请求一个例程）
    pub fn commands_mut(&mut self) -> &mut Commands {
        &mut self.commands
    }

    pub fn routines(&self) -> &RoutineManager {
        &self.routines
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config_store
    }

    pub fn command_sender(&self) -> ExternalCommandSender {
        self.command_sender.clone()
    }

    pub fn shared_period(&self) -> Arc<AtomicGamePeriod> {
        Arc::clone(&self.shared_period)
    }

    pub fn statistics(&self) -> &LoopStatistics {
        &self.stats
    }

    pub fn last_report(&self) -> Option<&LoopReport> {
        self.last_report.as_ref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.writer.cache_stats()
    }

    pub fn faults_cleared(&self) -> u64 {
        self.reader.faults_cleared()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn subsystem_names(&self) -> Vec<&'static str> {
        self.subsystems.iter().map(|s| s.name()).collect()
    }

    pub fn service_names(&self) -> Vec<&'static str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    pub fn has_subsystem(&self, name: &str) -> bool {
        self.subsystems.iter().any(|s| s.name() == name)
    }

    pub fn is_subscribed(&self) -> bool {
        self.config_subscription.is_some()
    }
}

/// 订阅配置变更：只在 Disabled 阶段转发给控制线程
fn subscribe_config_changes(
    store: &ConfigStore,
    period: Arc<AtomicGamePeriod>,
    tx: Sender<()>,
) -> ConfigSubscription {
    store.subscribe(move |_| {
        if period.get(Ordering::Acquire).is_enabled() {
            debug!("Config change deferred until disabled");
            return;
        }
        // 已有未处理的信号时无需再发：控制线程读取的是存储中的最新配置
        let _ = tx.try_send(());
    })
}

fn setup_summary(
    subsystems: &[Box<dyn Subsystem>],
    services: &[Box<dyn RobotService>],
    auto: &str,
) -> String {
    let mut summary = String::from("\n===================\nEnabled subsystems:\n-------------------\n");
    for subsystem in subsystems {
        summary.push_str(subsystem.name());
        summary.push('\n');
    }
    summary.push_str("=================\nEnabled services:\n-----------------\n");
    for service in services {
        summary.push_str(service.name());
        summary.push('\n');
    }
    summary.push_str("=================\nAuto: ");
    summary.push_str(auto);
    summary
}
