//! 已接受条目及其状态机
//!
//! ```text
//! Queued ──begin_submit──> Submitting ──succeed──> Succeeded
//!    │                         └────────fail─────> Failed(reason)
//!    └──cancel──> Cancelled
//! ```
//!
//! `Succeeded` / `Failed` / `Cancelled` 为终态，不允许再迁移。

use std::fmt;

use serde::Serialize;

use crate::error::TransitionError;
use crate::models::candidate::CandidateItem;

/// 条目 ID，等于其在已接受序列中的位置（从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 通过校验的条目
#[derive(Debug, Clone)]
pub struct AcceptedItem {
    id: ItemId,
    candidate: CandidateItem,
}

impl AcceptedItem {
    pub(crate) fn new(id: ItemId, candidate: CandidateItem) -> Self {
        Self { id, candidate }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.candidate.name()
    }

    pub fn candidate(&self) -> &CandidateItem {
        &self.candidate
    }
}

/// 条目状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemState {
    Queued,
    Submitting,
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

impl ItemState {
    pub fn name(&self) -> &'static str {
        match self {
            ItemState::Queued => "queued",
            ItemState::Submitting => "submitting",
            ItemState::Succeeded => "succeeded",
            ItemState::Failed { .. } => "failed",
            ItemState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Succeeded | ItemState::Failed { .. } | ItemState::Cancelled
        )
    }

    /// 生命周期中的位置，用于判断观察结果是否单调
    pub fn rank(&self) -> u8 {
        match self {
            ItemState::Queued => 0,
            ItemState::Submitting => 1,
            _ => 2,
        }
    }

    pub fn begin_submit(&self, item: ItemId) -> Result<ItemState, TransitionError> {
        match self {
            ItemState::Queued => Ok(ItemState::Submitting),
            other => Err(other.illegal(item, "submitting")),
        }
    }

    pub fn succeed(&self, item: ItemId) -> Result<ItemState, TransitionError> {
        match self {
            ItemState::Submitting => Ok(ItemState::Succeeded),
            other => Err(other.illegal(item, "succeeded")),
        }
    }

    pub fn fail(
        &self,
        item: ItemId,
        reason: impl Into<String>,
    ) -> Result<ItemState, TransitionError> {
        match self {
            ItemState::Submitting => Ok(ItemState::Failed {
                reason: reason.into(),
            }),
            other => Err(other.illegal(item, "failed")),
        }
    }

    /// 只有尚未开始提交的条目可以取消
    pub fn cancel(&self, item: ItemId) -> Result<ItemState, TransitionError> {
        match self {
            ItemState::Queued => Ok(ItemState::Cancelled),
            other => Err(other.illegal(item, "cancelled")),
        }
    }

    fn illegal(&self, item: ItemId, to: &'static str) -> TransitionError {
        TransitionError {
            item,
            from: self.name(),
            to,
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Failed { reason } => write!(f, "failed({})", reason),
            other => f.write_str(other.name()),
        }
    }
}
