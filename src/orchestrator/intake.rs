//! 文件接收：校验候选文件并分配 ItemId

use tracing::warn;

use crate::error::RejectReason;
use crate::models::{AcceptedItem, CandidateItem, ItemId, Rejection};
use crate::services::{ItemValidator, Verdict};

/// 校验结果：按原始顺序排列的已接受条目，以及被拒绝的候选文件
#[derive(Debug, Clone, Default)]
pub struct Intake {
    pub accepted: Vec<AcceptedItem>,
    pub rejections: Vec<Rejection>,
}

/// 逐个校验候选文件
///
/// ItemId 只分配给通过校验的文件，从 0 开始连续递增
pub fn intake(candidates: Vec<CandidateItem>, validator: &ItemValidator) -> Intake {
    let mut result = Intake::default();

    for candidate in candidates {
        match validator.validate(&candidate) {
            Verdict::Accepted => {
                let id = ItemId(result.accepted.len());
                result.accepted.push(AcceptedItem::new(id, candidate));
            }
            Verdict::Rejected(reason) => {
                log_rejection(&candidate, reason);
                result.rejections.push(Rejection {
                    name: candidate.name().to_string(),
                    reason,
                });
            }
        }
    }

    result
}

fn log_rejection(candidate: &CandidateItem, reason: RejectReason) {
    warn!(
        "⚠️ 文件 {} 未通过校验 ({}): 类型 {}, 大小 {}",
        candidate.name(),
        reason,
        candidate.kind(),
        crate::utils::logging::format_file_size(candidate.size())
    );
}
