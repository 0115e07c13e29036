//! 周期耗时探针
//!
//! 每个周期新建一个 [`LoopProbe`]，各阶段结束时记录检查点，周期结束时
//! 生成 [`LoopReport`]。超时只记录日志，从不中断循环。

use smallvec::SmallVec;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::warn;

type Checkpoints = SmallVec<[(&'static str, Duration); 16]>;

/// 单周期探针
#[derive(Debug, Clone)]
pub struct LoopProbe {
    budget: Duration,
    started_at: Instant,
    last_at: Instant,
    checkpoints: Checkpoints,
}

impl LoopProbe {
    pub fn start(budget: Duration) -> Self {
        Self::start_at(budget, Instant::now())
    }

    pub fn start_at(budget: Duration, now: Instant) -> Self {
        Self {
            budget,
            started_at: now,
            last_at: now,
            checkpoints: SmallVec::new(),
        }
    }

    /// 记录一个阶段（耗时 = 距上一个检查点）
    pub fn checkpoint(&mut self, name: &'static str) {
        self.checkpoint_at(name, Instant::now());
    }

    pub fn checkpoint_at(&mut self, name: &'static str, now: Instant) {
        let phase = now.saturating_duration_since(self.last_at);
        self.checkpoints.push((name, phase));
        self.last_at = now;
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn finish(self) -> LoopReport {
        self.finish_at(Instant::now())
    }

    pub fn finish_at(self, now: Instant) -> LoopReport {
        let elapsed = now.saturating_duration_since(self.started_at);
        LoopReport {
            elapsed,
            budget: self.budget,
            overrun: elapsed > self.budget,
            checkpoints: self.checkpoints,
        }
    }
}

/// 单周期耗时报告
#[derive(Debug, Clone, PartialEq)]
pub struct LoopReport {
    pub elapsed: Duration,
    pub budget: Duration,
    pub overrun: bool,
    checkpoints: Checkpoints,
}

impl LoopReport {
    pub fn checkpoints(&self) -> &[(&'static str, Duration)] {
        &self.checkpoints
    }

    pub fn checkpoint_names(&self) -> Vec<&'static str> {
        self.checkpoints.iter().map(|(name, _)| *name).collect()
    }

    /// 耗时最长的阶段
    pub fn slowest_phase(&self) -> Option<(&'static str, Duration)> {
        self.checkpoints.iter().copied().max_by_key(|(_, d)| *d)
    }
}

impl fmt::Display for LoopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}ms / {:.3}ms",
            self.elapsed.as_secs_f64() * 1e3,
            self.budget.as_secs_f64() * 1e3
        )?;
        for (name, phase) in &self.checkpoints {
            write!(f, " {}={:.3}ms", name, phase.as_secs_f64() * 1e3)?;
        }
        Ok(())
    }
}

/// 跨周期的耗时统计
#[derive(Debug, Clone, Default)]
pub struct LoopStatistics {
    pub ticks: u64,
    pub overruns: u64,
    pub consecutive_overruns: u32,
    pub max_elapsed: Duration,
    warning_threshold: u32,
}

impl LoopStatistics {
    pub fn new(warning_threshold: u32) -> Self {
        Self {
            warning_threshold,
            ..Default::default()
        }
    }

    pub fn set_warning_threshold(&mut self, warning_threshold: u32) {
        self.warning_threshold = warning_threshold;
    }

    /// 计入一个周期
    ///
    /// 超时周期记录 warn（附带各阶段耗时）；连续超时次数恰好达到阈值时额外警告一次。
    pub fn record(&mut self, report: &LoopReport) {
        self.ticks += 1;
        self.max_elapsed = self.max_elapsed.max(report.elapsed);

        if !report.overrun {
            self.consecutive_overruns = 0;
            return;
        }

        self.overruns += 1;
        self.consecutive_overruns += 1;
        warn!("Loop overrun: {}", report);
        if self.warning_threshold > 0 && self.consecutive_overruns == self.warning_threshold {
            warn!(
                "{} consecutive loop overruns ({} total in {} ticks)",
                self.consecutive_overruns, self.overruns, self.ticks
            );
        }
    }

    pub fn overrun_ratio(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.overruns as f64 / self.ticks as f64
        }
    }
}
