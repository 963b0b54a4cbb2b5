//! 进度快照与进度投影
//!
//! 编排器是唯一的写入方；外部只能读取快照或订阅快照的变化。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::TransitionError;
use crate::models::{ItemId, ItemState};

/// 某一时刻所有条目的状态
///
/// `transitions` 在每次状态迁移后加一，可用来确认没有遗漏或重复的更新
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    states: BTreeMap<ItemId, ItemState>,
    transitions: u64,
}

impl ProgressSnapshot {
    /// 所有条目都处于 Queued 的初始快照
    pub(crate) fn queued(ids: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            states: ids.into_iter().map(|id| (id, ItemState::Queued)).collect(),
            transitions: 0,
        }
    }

    /// 对单个条目执行一次迁移；失败时快照保持不变
    pub(crate) fn transition<F>(&mut self, id: ItemId, step: F) -> Result<(), TransitionError>
    where
        F: FnOnce(&ItemState) -> Result<ItemState, TransitionError>,
    {
        let current = self.states.get(&id).ok_or(TransitionError {
            item: id,
            from: "unknown",
            to: "any",
        })?;
        let next = step(current)?;
        self.states.insert(id, next);
        self.transitions += 1;
        Ok(())
    }

    pub fn states(&self) -> &BTreeMap<ItemId, ItemState> {
        &self.states
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemState> {
        self.states.get(&id)
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// 进度投影：每个条目的状态加上累计计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressView {
    pub entries: Vec<(ItemId, ItemState)>,
    pub queued: usize,
    pub submitting: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl ProgressView {
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// 已到达终态的条目数
    pub fn resolved(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }

    pub fn is_complete(&self) -> bool {
        !self.entries.is_empty() && self.resolved() == self.total()
    }

    /// `self` 是否可以是 `earlier` 之后的一次观察：
    /// 条目集合相同，且每个条目的状态都没有倒退
    pub fn is_successor_of(&self, earlier: &ProgressView) -> bool {
        if self.entries.len() != earlier.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .zip(&earlier.entries)
            .all(|((id, now), (prev_id, prev))| {
                id == prev_id
                    && now.rank() >= prev.rank()
                    && (!prev.is_terminal() || now == prev)
            })
    }
}

impl From<&ProgressSnapshot> for ProgressView {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        let mut view = ProgressView {
            entries: Vec::with_capacity(snapshot.len()),
            queued: 0,
            submitting: 0,
            succeeded: 0,
            failed: 0,
            cancelled: 0,
        };
        for (id, state) in snapshot.states() {
            match state {
                ItemState::Queued => view.queued += 1,
                ItemState::Submitting => view.submitting += 1,
                ItemState::Succeeded => view.succeeded += 1,
                ItemState::Failed { .. } => view.failed += 1,
                ItemState::Cancelled => view.cancelled += 1,
            }
            view.entries.push((*id, state.clone()));
        }
        view
    }
}
