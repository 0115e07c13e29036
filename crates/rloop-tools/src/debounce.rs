//! # 时间去抖布尔状态
//!
//! 将快速变化的请求值转换为稳定的观测值：请求值必须持续至少
//! `min_duration` 才会被观测到。激活与释放两个方向使用相同的驻留时间。
//!
//! 典型用途：气缸伸出状态估计（电磁阀指令立即写出，但机构到位需要时间）。
//!
//! # 时序示例（min_duration = 100ms，初始 false）
//!
//! ```text
//! t=0ms    set(true)   → 观测 false（计时开始）
//! t=110ms  set(true)   → 观测 true
//! t=110ms  set(false)  → 观测 true（计时重新开始）
//! t=220ms  set(false)  → 观测 false
//! ```

use std::time::{Duration, Instant};

/// 时间去抖布尔状态机
///
/// 只能通过 [`set`](Self::set) / [`set_at`](Self::set_at) 修改，自身持有计时器。
#[derive(Debug, Clone)]
pub struct DebouncedBooleanState {
    min_duration: Duration,
    stable: bool,
    requested: bool,
    last_change: Option<Instant>,
}

impl DebouncedBooleanState {
    /// 创建去抖状态
    ///
    /// # 参数
    ///
    /// - `min_duration`: 请求值必须保持的最短时间
    /// - `initial`: 初始稳定值（同时作为初始请求值）
    pub fn new(min_duration: Duration, initial: bool) -> Self {
        Self {
            min_duration,
            stable: initial,
            requested: initial,
            last_change: None,
        }
    }

    /// 以当前时间提交请求值
    pub fn set(&mut self, requested: bool) {
        self.set_at(requested, Instant::now());
    }

    /// 以显式时间戳提交请求值
    ///
    /// 时间显式传入，便于在单元测试中驱动而无需真实休眠。
    pub fn set_at(&mut self, requested: bool, now: Instant) {
        if requested != self.requested || self.last_change.is_none() {
            self.requested = requested;
            self.last_change = Some(now);
        }

        if requested == self.stable {
            return;
        }

        let held_for = self
            .last_change
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since));
        if held_for >= self.min_duration {
            self.stable = requested;
        }
    }

    /// 当前稳定（观测）值，永远不是原始请求值
    pub fn is_extended(&self) -> bool {
        self.stable
    }

    /// 最近一次请求值
    pub fn requested(&self) -> bool {
        self.requested
    }

    /// 最短驻留时间
    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }
}
