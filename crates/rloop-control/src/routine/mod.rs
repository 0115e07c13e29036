//! 例程（Routine）- 可组合的自主 / 遥控行为单元
//!
//! # 结构
//!
//! - [`Routine`] trait：叶子行为，只关心 `start` / `update → finished` / `stop`
//! - [`RoutineNode`]：带标签的变体 {Leaf, Sequential, Parallel, Race}，
//!   统一管理生命周期，组合变体拥有有序的子节点
//! - [`RoutineManager`]：调度器，FIFO 启动顶层例程
//!
//! # 生命周期
//!
//! ```text
//! Requested ──首次调度──▶ Running ──update 返回 true──▶ Finished
//!                           │
//!                           └──cancel（清空 / 阶段切换）──▶ Canceled
//! ```
//!
//! 取消是协作式的：只在调度点生效，不会中断正在执行的 `update`。
//!
//! # 组合语义
//!
//! - **Sequential**: 每周期只更新当前子节点；子节点结束后游标前进，下一个子节点在下一周期启动
//! - **Parallel**: 每周期更新所有未结束的子节点；全部结束时结束
//! - **Race**: 同 Parallel，但任一子节点结束即结束，其余被取消

mod manager;
mod routines;

pub use manager::RoutineManager;
pub use routines::{
    ConditionRoutine, DriveOutputsRoutine, DriveSetOdometryRoutine, IntakeRoutine,
    ShooterRoutine, TimedRoutine, WaitRoutine,
};

use crate::commands::Commands;
use crate::state::RobotState;
use rloop_tools::Pose2d;
use std::fmt;
use tracing::debug;

/// 叶子行为接口
///
/// 组合行为不实现此 trait，而是由 [`RoutineNode`] 的组合变体表达。
pub trait Routine {
    /// 用于日志的名称
    fn name(&self) -> &'static str;

    /// 首次被调度时调用一次
    fn start(&mut self, commands: &mut Commands, state: &RobotState) {
        let _ = (commands, state);
    }

    /// 每周期调用，返回 `true` 表示已完成
    fn update(&mut self, commands: &mut Commands, state: &RobotState) -> bool;

    /// 完成或被取消时调用一次（仅当 `start` 已调用过）
    fn stop(&mut self, commands: &mut Commands, state: &RobotState) {
        let _ = (commands, state);
    }

    /// 该例程声明的路径点（用于遍历例程树导出路径）
    fn waypoint(&self) -> Option<Pose2d> {
        None
    }
}

/// 例程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutinePhase {
    #[default]
    Requested,
    Running,
    Finished,
    Canceled,
}

impl RoutinePhase {
    pub fn is_done(self) -> bool {
        matches!(self, Self::Finished | Self::Canceled)
    }
}

/// 例程变体
pub enum RoutineKind {
    Leaf(Box<dyn Routine>),
    Sequential {
        children: Vec<RoutineNode>,
        cursor: usize,
    },
    Parallel(Vec<RoutineNode>),
    Race(Vec<RoutineNode>),
}

/// 例程树节点
pub struct RoutineNode {
    phase: RoutinePhase,
    kind: RoutineKind,
}

impl RoutineNode {
    pub fn leaf(routine: impl Routine + 'static) -> Self {
        Self::from_kind(RoutineKind::Leaf(Box::new(routine)))
    }

    pub fn sequential(children: Vec<RoutineNode>) -> Self {
        Self::from_kind(RoutineKind::Sequential {
            children,
            cursor: 0,
        })
    }

    pub fn parallel(children: Vec<RoutineNode>) -> Self {
        Self::from_kind(RoutineKind::Parallel(children))
    }

    pub fn race(children: Vec<RoutineNode>) -> Self {
        Self::from_kind(RoutineKind::Race(children))
    }

    fn from_kind(kind: RoutineKind) -> Self {
        Self {
            phase: RoutinePhase::Requested,
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            RoutineKind::Leaf(routine) => routine.name(),
            RoutineKind::Sequential { .. } => "Sequential",
            RoutineKind::Parallel(_) => "Parallel",
            RoutineKind::Race(_) => "Race",
        }
    }

    pub fn phase(&self) -> RoutinePhase {
        self.phase
    }

    /// 叶子例程声明的路径点
    pub fn waypoint(&self) -> Option<Pose2d> {
        match &self.kind {
            RoutineKind::Leaf(routine) => routine.waypoint(),
            _ => None,
        }
    }

    pub fn kind(&self) -> &RoutineKind {
        &self.kind
    }

    /// 子节点（仅组合变体）
    pub fn children(&self) -> Option<&[RoutineNode]> {
        match &self.kind {
            RoutineKind::Leaf(_) => None,
            RoutineKind::Sequential { children, .. }
            | RoutineKind::Parallel(children)
            | RoutineKind::Race(children) => Some(children),
        }
    }

    /// 深度优先前序遍历，`visitor` 接收节点和深度（根为 0）
    pub fn walk<F>(&self, visitor: &mut F)
    where
        F: FnMut(&RoutineNode, usize),
    {
        self.walk_at(visitor, 0);
    }

    fn walk_at<F>(&self, visitor: &mut F, depth: usize)
    where
        F: FnMut(&RoutineNode, usize),
    {
        visitor(self, depth);
        if let Some(children) = self.children() {
            for child in children {
                child.walk_at(visitor, depth + 1);
            }
        }
    }

    /// 推进一个调度周期，返回是否已结束
    ///
    /// 首次调用时启动；结束时自动 `stop`。已结束 / 已取消的节点直接返回 `true`。
    pub fn execute(&mut self, commands: &mut Commands, state: &RobotState) -> bool {
        if self.phase.is_done() {
            return true;
        }

        if self.phase == RoutinePhase::Requested {
            debug!("routine {} started", self.name());
            if let RoutineKind::Leaf(routine) = &mut self.kind {
                routine.start(commands, state);
            }
            self.phase = RoutinePhase::Running;
        }

        let finished = match &mut self.kind {
            RoutineKind::Leaf(routine) => {
                let finished = routine.update(commands, state);
                if finished {
                    routine.stop(commands, state);
                }
                finished
            },
            RoutineKind::Sequential { children, cursor } => {
                if let Some(current) = children.get_mut(*cursor)
                    && current.execute(commands, state)
                {
                    *cursor += 1;
                }
                *cursor >= children.len()
            },
            RoutineKind::Parallel(children) => {
                let mut all_finished = true;
                for child in children.iter_mut() {
                    all_finished &= child.execute(commands, state);
                }
                all_finished
            },
            RoutineKind::Race(children) => {
                let mut any_finished = children.is_empty();
                for child in children.iter_mut() {
                    any_finished |= child.execute(commands, state);
                }
                if any_finished {
                    for child in children.iter_mut() {
                        child.cancel(commands, state);
                    }
                }
                any_finished
            },
        };

        if finished {
            debug!("routine {} finished", self.name());
            self.phase = RoutinePhase::Finished;
        }
        finished
    }

    /// 立即取消（不论进度）
    ///
    /// 已启动但未结束的叶子会收到 `stop`；从未启动的节点直接标记为取消。
    pub fn cancel(&mut self, commands: &mut Commands, state: &RobotState) {
        match self.phase {
            RoutinePhase::Finished | RoutinePhase::Canceled => return,
            RoutinePhase::Requested => {
                self.phase = RoutinePhase::Canceled;
                return;
            },
            RoutinePhase::Running => {},
        }

        match &mut self.kind {
            RoutineKind::Leaf(routine) => routine.stop(commands, state),
            RoutineKind::Sequential { children, .. }
            | RoutineKind::Parallel(children)
            | RoutineKind::Race(children) => {
                for child in children.iter_mut() {
                    child.cancel(commands, state);
                }
            },
        }
        debug!("routine {} canceled", self.name());
        self.phase = RoutinePhase::Canceled;
    }
}

impl fmt::Debug for RoutineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RoutineNode");
        s.field("name", &self.name()).field("phase", &self.phase);
        if let Some(children) = self.children() {
            s.field("children", &children);
        }
        s.finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn run_until_finished(node: &mut RoutineNode, max_ticks: usize) -> usize {
        let mut commands = Commands::new();
        let state = RobotState::new();
        for tick in 1..=max_ticks {
            if node.execute(&mut commands, &state) {
                return tick;
            }
        }
        panic!("routine did not finish within {} ticks", max_ticks);
    }

    #[test]
    fn test_leaf_lifecycle() {
        let log = new_log();
        let mut node = ScriptedRoutine::node("a", 2, &log);
        assert_eq!(node.phase(), RoutinePhase::Requested);

        assert_eq!(run_until_finished(&mut node, 10), 2);
        assert_eq!(node.phase(), RoutinePhase::Finished);
        assert_eq!(
            *log.borrow(),
            vec!["a:start", "a:update", "a:update", "a:stop"]
        );
    }

    #[test]
    fn test_sequential_runs_children_in_order() {
        let log = new_log();
        let mut node = RoutineNode::sequential(vec![
            ScriptedRoutine::node("a", 2, &log),
            ScriptedRoutine::node("b", 1, &log),
        ]);

        assert_eq!(run_until_finished(&mut node, 10), 3);
        assert_eq!(
            *log.borrow(),
            vec![
                "a:start", "a:update", "a:update", "a:stop", "b:start", "b:update", "b:stop"
            ]
        );
    }

    #[test]
    fn test_parallel_waits_for_all_children() {
        let log = new_log();
        let mut node = RoutineNode::parallel(vec![
            ScriptedRoutine::node("fast", 1, &log),
            ScriptedRoutine::node("slow", 3, &log),
        ]);

        assert_eq!(run_until_finished(&mut node, 10), 3);
        let events = log.borrow();
        assert_eq!(events.iter().filter(|e| *e == "fast:update").count(), 1);
        assert_eq!(events.iter().filter(|e| *e == "slow:update").count(), 3);
        assert_eq!(events.last().map(String::as_str), Some("slow:stop"));
    }

    #[test]
    fn test_race_cancels_losers() {
        let log = new_log();
        let mut node = RoutineNode::race(vec![
            ScriptedRoutine::node("winner", 2, &log),
            ScriptedRoutine::node("loser", 5, &log),
        ]);

        assert_eq!(run_until_finished(&mut node, 10), 2);
        let events = log.borrow();
        assert!(events.contains(&"winner:stop".to_string()));
        assert!(events.contains(&"loser:stop".to_string()));
        assert_eq!(events.iter().filter(|e| *e == "loser:update").count(), 2);
        if let Some(children) = node.children() {
            assert_eq!(children[1].phase(), RoutinePhase::Canceled);
        }
    }

    #[test]
    fn test_empty_composites_finish_immediately() {
        assert_eq!(run_until_finished(&mut RoutineNode::sequential(vec![]), 1), 1);
        assert_eq!(run_until_finished(&mut RoutineNode::parallel(vec![]), 1), 1);
        assert_eq!(run_until_finished(&mut RoutineNode::race(vec![]), 1), 1);
    }

    #[test]
    fn test_nested_composites() {
        let log = new_log();
        let mut node = RoutineNode::sequential(vec![
            RoutineNode::parallel(vec![
                ScriptedRoutine::node("a", 1, &log),
                ScriptedRoutine::node("b", 2, &log),
            ]),
            ScriptedRoutine::node("c", 1, &log),
        ]);

        assert_eq!(run_until_finished(&mut node, 10), 3);
        let events = log.borrow();
        let b_stop = events.iter().position(|e| e == "b:stop").unwrap();
        let c_start = events.iter().position(|e| e == "c:start").unwrap();
        assert!(b_stop < c_start);
    }

    #[test]
    fn test_cancel_only_stops_started_leaves() {
        let log = new_log();
        let mut commands = Commands::new();
        let state = RobotState::new();
        let mut node = RoutineNode::sequential(vec![
            ScriptedRoutine::node("a", 5, &log),
            ScriptedRoutine::node("b", 1, &log),
        ]);

        node.execute(&mut commands, &state);
        node.cancel(&mut commands, &state);

        assert_eq!(node.phase(), RoutinePhase::Canceled);
        assert_eq!(*log.borrow(), vec!["a:start", "a:update", "a:stop"]);
        // 取消后再执行不会有任何效果
        assert!(node.execute(&mut commands, &state));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_walk_visits_tree_in_preorder() {
        let log = new_log();
        let node = RoutineNode::sequential(vec![
            ScriptedRoutine::node("a", 1, &log),
            RoutineNode::parallel(vec![
                ScriptedRoutine::node("b", 1, &log),
                ScriptedRoutine::node("c", 1, &log),
            ]),
        ]);

        let mut visited = Vec::new();
        node.walk(&mut |n, depth| visited.push((n.name(), depth)));
        assert_eq!(
            visited,
            vec![
                ("Sequential", 0),
                ("a", 1),
                ("Parallel", 1),
                ("b", 2),
                ("c", 2)
            ]
        );
    }
}
