//! Loop Runner - 固定周期驱动 [`Robot`]
//!
//! - **精确定时**: `spin_sleep` 睡眠到绝对锚点，周期内的耗时自动扣除
//! - **超时追赶**: 锚点已过时不睡眠，锚点重置到当前时刻，不累积延迟
//! - **停止**: 外部置位停止标志（例如 Ctrl+C 处理器）或达到最大迭代次数
//!
//! ```rust,ignore
//! let stop = AtomicBool::new(false);
//! let summary = run_loop(&mut robot, &LoopConfig::default(), &stop, |_, _| {})?;
//! ```

use crate::config::RobotConfig;
use crate::error::ControlError;
use crate::probe::LoopReport;
use crate::robot::Robot;
use rloop_driver::Hardware;
use spin_sleep::SpinSleeper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 控制循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 周期
    pub period: Duration,

    /// 最大迭代次数（None 表示运行到停止标志置位）
    pub max_iterations: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(20),
            max_iterations: None,
        }
    }
}

impl LoopConfig {
    pub fn from_robot_config(config: &RobotConfig) -> Self {
        Self {
            period: config.period(),
            max_iterations: None,
        }
    }
}

/// 循环结束时的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub iterations: u64,
    pub overruns: u64,
    /// 追赶锚点的次数（周期 + 回调耗时超过了周期）
    pub missed_deadlines: u64,
    pub max_elapsed: Duration,
}

/// 运行控制循环（阻塞）
///
/// 每个周期调用一次 [`Robot::tick`]，随后调用 `after_tick`（仿真在这里推进硬件模型）。
/// 退出前调用 [`Robot::shutdown`]，执行器回到空闲输出。
pub fn run_loop<H, F>(
    robot: &mut Robot<H>,
    config: &LoopConfig,
    stop: &AtomicBool,
    mut after_tick: F,
) -> Result<LoopSummary, ControlError>
where
    H: Hardware,
    F: FnMut(&mut Robot<H>, &LoopReport),
{
    if config.period.is_zero() {
        return Err(ControlError::InvalidConfig(
            "loop period must be > 0".to_string(),
        ));
    }

    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;
        use tracing::warn;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => {
                info!("Control thread priority set to MAX (realtime)");
            },
            Err(e) => {
                warn!(
                    "Failed to set control thread priority: {}. \
                    On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                    e
                );
            },
        }
    }

    let sleeper = SpinSleeper::default();
    let period = config.period;
    let mut next_tick = Instant::now() + period;
    let mut iterations = 0u64;
    let mut missed_deadlines = 0u64;

    info!("Control loop started: period={:?}", period);

    loop {
        if stop.load(Ordering::Acquire) {
            info!("Stop requested");
            break;
        }
        if let Some(max) = config.max_iterations
            && iterations >= max
        {
            break;
        }

        let report = robot.tick();
        after_tick(robot, &report);
        iterations += 1;

        let now = Instant::now();
        if next_tick > now {
            sleeper.sleep(next_tick - now);
            next_tick += period;
        } else {
            // 超时：不睡眠，重置锚点
            debug!(
                "Missed deadline by {:?}, resetting anchor",
                now.duration_since(next_tick)
            );
            missed_deadlines += 1;
            next_tick = now + period;
        }
    }

    robot.shutdown();

    let stats = robot.statistics();
    let summary = LoopSummary {
        iterations,
        overruns: stats.overruns,
        missed_deadlines,
        max_elapsed: stats.max_elapsed,
    };
    info!(
        "Control loop stopped: {} iterations, {} overruns, {} missed deadlines, max {:?}",
        summary.iterations, summary.overruns, summary.missed_deadlines, summary.max_elapsed
    );
    Ok(summary)
}
