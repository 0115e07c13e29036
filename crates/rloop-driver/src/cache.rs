//! 变化检测输出缓存
//!
//! 总线写入相对昂贵，重复写入相同指令只会浪费带宽。本模块记录每个执行器
//! **最近一次成功写入** 的指令，只有在以下情况才真正写总线：
//!
//! - 该执行器尚无记录
//! - 模式标签不同（包括电机 / 电磁阀类型不同）
//! - 任一数值字段差异超过容差
//!
//! `apply()` 的返回值让"是否真的写了"可被测试和诊断观察。

use crate::actuator::{ActuatorCommand, ActuatorId};
use crate::hardware::HardwareWrite;
use std::collections::HashMap;
use tracing::{trace, warn};

/// 默认数值容差
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// 缓存统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// 实际写入次数
    pub writes: u64,
    /// 因无变化被跳过的次数
    pub skipped: u64,
    /// 写入失败次数
    pub failures: u64,
}

/// 变化检测输出缓存
#[derive(Debug, Clone)]
pub struct OutputCache {
    last_applied: HashMap<ActuatorId, ActuatorCommand>,
    tolerance: f64,
    stats: CacheStats,
}

impl Default for OutputCache {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputCache {
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            last_applied: HashMap::new(),
            tolerance: tolerance.abs(),
            stats: CacheStats::default(),
        }
    }

    /// 必要时写入指令
    ///
    /// # 返回
    ///
    /// - `true`: 执行了物理写入且成功，缓存基线已更新
    /// - `false`: 与基线一致被跳过，或写入失败（基线保持不变，下次会重试）
    pub fn apply<W: HardwareWrite + ?Sized>(
        &mut self,
        writer: &mut W,
        id: ActuatorId,
        command: &ActuatorCommand,
    ) -> bool {
        if self.is_current(id, command) {
            self.stats.skipped += 1;
            return false;
        }

        match writer.write(id, command) {
            Ok(()) => {
                trace!("{}: wrote {:?}", id, command);
                self.last_applied.insert(id, *command);
                self.stats.writes += 1;
                true
            },
            Err(e) => {
                warn!("{}: write failed, keeping previous baseline: {}", id, e);
                self.stats.failures += 1;
                false
            },
        }
    }

    /// 指令是否与缓存基线一致（不写入）
    pub fn is_current(&self, id: ActuatorId, command: &ActuatorCommand) -> bool {
        self.last_applied
            .get(&id)
            .is_some_and(|last| last.approx_eq(command, self.tolerance))
    }

    /// 最近一次成功写入的指令
    pub fn last_applied(&self, id: ActuatorId) -> Option<&ActuatorCommand> {
        self.last_applied.get(&id)
    }

    /// 丢弃某个执行器的基线，下次 `apply` 必然写入
    ///
    /// 用于控制器被外部重置（传感器清零、重新配置）之后。
    pub fn invalidate(&mut self, id: ActuatorId) {
        self.last_applied.remove(&id);
    }

    pub fn clear(&mut self) {
        self.last_applied.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
