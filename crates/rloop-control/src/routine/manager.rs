//! 例程调度器

use super::RoutineNode;
use crate::commands::Commands;
use crate::state::RobotState;
use tracing::{debug, info};

/// 例程调度器
///
/// 顶层例程按加入顺序（FIFO）启动；同一周期内按加入顺序更新。
/// 冲突例程不会被自动抢占，调用方需先设置
/// [`Commands::should_clear_current_routines`] 或调用 [`clear_running_routines`]。
///
/// [`clear_running_routines`]: RoutineManager::clear_running_routines
#[derive(Debug, Default)]
pub struct RoutineManager {
    running: Vec<RoutineNode>,
}

impl RoutineManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接加入一个例程（下一次 `update` 时启动）
    pub fn add_wanted_routine(&mut self, routine: RoutineNode) {
        debug!("routine {} queued", routine.name());
        self.running.push(routine);
    }

    /// 推进一个调度周期
    ///
    /// 1. 若 `commands.should_clear_current_routines`，先取消所有运行中的例程并复位该标志
    /// 2. 取出 `commands` 中待调度的例程，按 FIFO 加入
    /// 3. 执行所有例程，移除已结束的
    pub fn update(&mut self, commands: &mut Commands, state: &RobotState) {
        if commands.should_clear_current_routines {
            self.clear_running_routines(commands, state);
            commands.should_clear_current_routines = false;
        }

        for routine in commands.take_wanted_routines() {
            self.add_wanted_routine(routine);
        }

        self.running
            .retain_mut(|routine| !routine.execute(commands, state));
    }

    /// 立即取消所有运行中的例程并清空集合
    pub fn clear_running_routines(&mut self, commands: &mut Commands, state: &RobotState) {
        if self.running.is_empty() {
            return;
        }
        info!("Clearing {} running routine(s)", self.running.len());
        for mut routine in self.running.drain(..) {
            routine.cancel(commands, state);
        }
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn running_names(&self) -> Vec<&'static str> {
        self.running.iter().map(RoutineNode::name).collect()
    }

    pub fn running(&self) -> &[RoutineNode] {
        &self.running
    }
}
