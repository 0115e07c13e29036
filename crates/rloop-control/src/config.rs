//! # 机器人配置
//!
//! - [`RobotConfig`]: 纯数据（serde + TOML），所有字段都有默认值
//! - [`ConfigStore`]: 当前配置（`ArcSwap`，读取无锁）+ 变更订阅
//! - [`ConfigSubscription`]: 订阅句柄，Drop 时自动注销回调
//!
//! # 变更通知
//!
//! 回调在调用 [`ConfigStore::update`] 的线程上同步执行，且在监听列表锁之外调用。
//! 回调内部不得直接修改控制循环的状态，应通过队列转交（见 `Robot`）。

use crate::error::ControlError;
use crate::service::SERVICE_NAMES;
use crate::subsystems::SUBSYSTEM_NAMES;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rloop_tools::InterpolationTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

/// 机器人配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// 启用的子系统（顺序即每周期的更新顺序）
    pub enabled_subsystems: Vec<String>,

    /// 启用的服务
    pub enabled_services: Vec<String>,

    /// 每周期轮询并清除粘滞故障
    pub check_faults: bool,

    /// 禁用阶段底盘滑行（否则刹车）
    pub coast_drive_when_disabled: bool,

    /// 禁用阶段的视觉模式
    pub enable_vision_when_disabled: bool,
    pub vision_pipeline_when_disabled: u8,

    /// 控制周期（毫秒）
    pub loop_period_ms: u64,

    /// 连续超时多少个周期后发出警告
    pub overrun_warning_threshold: u32,

    /// 电磁阀最短驻留时间（毫秒）
    pub solenoid_dwell_ms: u64,

    /// 视觉距离（英寸）→ 飞轮转速
    pub shooter_distance_to_velocity: Vec<(f64, f64)>,

    /// 摇杆死区
    pub drive_deadband: f64,

    /// 外部指令队列容量
    pub command_queue_capacity: usize,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            enabled_subsystems: SUBSYSTEM_NAMES.iter().map(|s| s.to_string()).collect(),
            enabled_services: vec!["command_receiver".to_string()],
            check_faults: true,
            coast_drive_when_disabled: true,
            enable_vision_when_disabled: false,
            vision_pipeline_when_disabled: 0,
            loop_period_ms: 20,
            overrun_warning_threshold: 5,
            solenoid_dwell_ms: 200,
            shooter_distance_to_velocity: vec![
                (60.0, 3000.0),
                (120.0, 3600.0),
                (180.0, 4300.0),
                (240.0, 5000.0),
            ],
            drive_deadband: 0.05,
            command_queue_capacity: 64,
        }
    }
}

impl RobotConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ControlError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ControlError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ControlError> {
        toml::to_string_pretty(self).map_err(|e| ControlError::InvalidConfig(e.to_string()))
    }

    /// 控制周期
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn solenoid_dwell(&self) -> Duration {
        Duration::from_millis(self.solenoid_dwell_ms)
    }

    /// 构造发射机构插值表
    pub fn shooter_table(&self) -> Result<InterpolationTable, ControlError> {
        Ok(InterpolationTable::try_from(
            self.shooter_distance_to_velocity.as_slice(),
        )?)
    }

    pub fn is_subsystem_enabled(&self, name: &str) -> bool {
        self.enabled_subsystems.iter().any(|s| s == name)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.loop_period_ms == 0 {
            return Err(ControlError::InvalidConfig(
                "loop_period_ms must be > 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.drive_deadband) {
            return Err(ControlError::InvalidConfig(format!(
                "drive_deadband must be in [0, 1), got {}",
                self.drive_deadband
            )));
        }
        if self.command_queue_capacity == 0 {
            return Err(ControlError::InvalidConfig(
                "command_queue_capacity must be > 0".to_string(),
            ));
        }

        for (i, name) in self.enabled_subsystems.iter().enumerate() {
            if !SUBSYSTEM_NAMES.contains(&name.as_str()) {
                return Err(ControlError::UnknownSubsystem(name.clone()));
            }
            if self.enabled_subsystems[..i].contains(name) {
                return Err(ControlError::InvalidConfig(format!(
                    "subsystem '{}' listed twice",
                    name
                )));
            }
        }
        for (i, name) in self.enabled_services.iter().enumerate() {
            if !SERVICE_NAMES.contains(&name.as_str()) {
                return Err(ControlError::UnknownService(name.clone()));
            }
            if self.enabled_services[..i].contains(name) {
                return Err(ControlError::InvalidConfig(format!(
                    "service '{}' listed twice",
                    name
                )));
            }
        }

        if self.is_subsystem_enabled("shooter") && self.shooter_distance_to_velocity.is_empty() {
            return Err(ControlError::InvalidConfig(
                "shooter enabled but shooter_distance_to_velocity is empty".to_string(),
            ));
        }
        self.shooter_table()?;
        Ok(())
    }
}

type Listener = Arc<dyn Fn(&RobotConfig) + Send + Sync>;

struct StoreInner {
    current: ArcSwap<RobotConfig>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

/// 配置存储
///
/// 可 `Clone`，所有克隆共享同一份配置与订阅列表。
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
}

impl ConfigStore {
    pub fn new(config: RobotConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: ArcSwap::from_pointee(config),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// 当前配置快照
    pub fn current(&self) -> Arc<RobotConfig> {
        self.inner.current.load_full()
    }

    /// 替换配置并通知所有订阅者
    ///
    /// 校验失败时配置保持不变，不通知。
    pub fn update(&self, config: RobotConfig) -> Result<(), ControlError> {
        config.validate()?;
        self.inner.current.store(Arc::new(config.clone()));

        // 锁外调用，回调中可以安全地订阅 / 注销
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        info!("Config updated, notifying {} listener(s)", listeners.len());
        for listener in listeners {
            listener(&config);
        }
        Ok(())
    }

    /// 从文件重新加载
    pub fn reload_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ControlError> {
        self.update(RobotConfig::load_from_file(path)?)
    }

    /// 订阅配置变更
    ///
    /// 返回的 [`ConfigSubscription`] 被 Drop 时回调自动注销。
    #[must_use = "dropping the subscription unregisters the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> ConfigSubscription
    where
        F: Fn(&RobotConfig) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        debug!("Config listener {} registered", id);
        ConfigSubscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(RobotConfig::default())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &self.current())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// 配置订阅句柄
///
/// 只持有存储的弱引用：存储先于句柄释放时，Drop 不做任何事。
#[derive(Debug)]
pub struct ConfigSubscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl ConfigSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 显式注销（等价于 drop）
    pub fn unsubscribe(self) {}
}

impl Drop for ConfigSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
            debug!("Config listener {} unregistered", self.id);
        }
    }
}
