//! 批次报告

use serde::Serialize;

use crate::error::RejectReason;
use crate::models::item::{ItemId, ItemState};

/// 单个条目的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub id: ItemId,
    pub name: String,
    pub state: ItemState,
    pub message: Option<String>,
}

/// 批次报告
///
/// 每次运行生成一份，生成后不可变。条目按 ItemId 排序，
/// 计数始终等于对应终态条目的数量。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    items: Vec<ItemOutcome>,
    succeeded: usize,
    failed: usize,
    cancelled: usize,
}

impl BatchReport {
    /// 汇总条目结果；调用方保证所有条目都已处于终态
    pub(crate) fn from_outcomes(mut items: Vec<ItemOutcome>) -> Self {
        items.sort_by_key(|o| o.id);
        debug_assert!(items.iter().all(|o| o.state.is_terminal()));

        let mut report = Self {
            items,
            succeeded: 0,
            failed: 0,
            cancelled: 0,
        };
        for outcome in &report.items {
            match outcome.state {
                ItemState::Succeeded => report.succeeded += 1,
                ItemState::Failed { .. } => report.failed += 1,
                ItemState::Cancelled => report.cancelled += 1,
                ItemState::Queued | ItemState::Submitting => {}
            }
        }
        report
    }

    pub fn items(&self) -> &[ItemOutcome] {
        &self.items
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemOutcome> {
        self.items.iter().find(|o| o.id == id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|o| matches!(o.state, ItemState::Failed { .. }))
    }
}

/// 被校验拒绝的候选文件，不占用 ItemId
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub name: String,
    pub reason: RejectReason,
}

/// 完整提交的结果：批次报告加上单独列出的拒绝记录
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub report: BatchReport,
    pub rejections: Vec<Rejection>,
}
