//! 单文件上传流程 - 流程层
//!
//! 核心职责：定义"一个文件"从开始提交到得到结果的过程
//!
//! 不持有状态，也不修改条目状态；状态迁移由编排器负责

use tracing::{debug, info, warn};

use crate::infrastructure::{SubmissionChannel, SubmitOutcome};
use crate::models::AcceptedItem;
use crate::utils::logging::{format_file_size, truncate_text};
use crate::workflow::upload_ctx::UploadCtx;

pub const SUCCESS_MESSAGE: &str = "上传成功";
pub const FAILURE_MESSAGE: &str = "上传失败";
pub const CANCELLED_MESSAGE: &str = "已取消，未提交";

/// 单个文件的上传结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Succeeded,
    Failed(String),
}

impl UploadResult {
    /// 面向用户的诊断信息
    pub fn message(&self) -> String {
        match self {
            UploadResult::Succeeded => SUCCESS_MESSAGE.to_string(),
            UploadResult::Failed(reason) => reason.clone(),
        }
    }
}

/// 单文件上传流程
#[derive(Debug, Clone, Default)]
pub struct UploadFlow {
    verbose_logging: bool,
}

impl UploadFlow {
    pub fn new(verbose_logging: bool) -> Self {
        Self { verbose_logging }
    }

    /// 通过提交通道提交一个文件
    ///
    /// 这是编排器唯一的挂起点；通道返回的任何失败都在这里转换为
    /// `UploadResult::Failed`，不会向上抛出
    pub async fn run<C>(&self, channel: &C, item: &AcceptedItem, ctx: &UploadCtx) -> UploadResult
    where
        C: SubmissionChannel + ?Sized,
    {
        let tag = ctx.tag();
        info!(
            "{} 📤 正在上传 {} ({})",
            tag,
            item.name(),
            format_file_size(item.candidate().size())
        );
        if self.verbose_logging {
            debug!("{} 类型: {} 目标: {}", tag, item.candidate().kind(), ctx);
        }

        match channel.submit(item, &ctx.destination).await {
            SubmitOutcome::Success => {
                info!("{} ✅ 上传成功", tag);
                UploadResult::Succeeded
            }
            SubmitOutcome::Failure(message) => {
                let message = if message.trim().is_empty() {
                    FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                warn!("{} ❌ 上传失败: {}", tag, truncate_text(&message, 120));
                UploadResult::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Destination, ScriptedChannel};
    use crate::models::{CandidateItem, ContentKind, ItemId};

    fn item(name: &str) -> AcceptedItem {
        AcceptedItem::new(
            ItemId(0),
            CandidateItem::from_bytes(name, ContentKind::pdf(), vec![0u8; 16]),
        )
    }

    fn ctx() -> UploadCtx {
        UploadCtx::new(Destination::new("7"), ItemId(0), 0, 1)
    }

    #[tokio::test]
    async fn test_success_maps_to_succeeded() {
        let channel = ScriptedChannel::new();
        let result = UploadFlow::default().run(&channel, &item("a.pdf"), &ctx()).await;

        assert_eq!(result, UploadResult::Succeeded);
        assert_eq!(result.message(), SUCCESS_MESSAGE);
        assert_eq!(channel.calls()[0].destination, "7");
    }

    #[tokio::test]
    async fn test_empty_failure_message_gets_default() {
        let channel = ScriptedChannel::new();
        channel.fail("a.pdf", "  ");
        channel.fail("b.pdf", "Job not found");

        let flow = UploadFlow::new(true);
        assert_eq!(
            flow.run(&channel, &item("a.pdf"), &ctx()).await,
            UploadResult::Failed(FAILURE_MESSAGE.to_string())
        );
        assert_eq!(
            flow.run(&channel, &item("b.pdf"), &ctx()).await.message(),
            "Job not found"
        );
    }

    #[test]
    fn test_ctx_tag_is_one_based() {
        let ctx = UploadCtx::new(Destination::new("7"), ItemId(1), 1, 3);
        assert_eq!(ctx.tag(), "[文件 2/3]");
    }

    #[test]
    fn test_ctx_tag_uses_position_not_id() {
        // 稀疏 ID：第二个文件的 ID 是 7
        let ctx = UploadCtx::new(Destination::new("7"), ItemId(7), 1, 2);
        assert_eq!(ctx.tag(), "[文件 2/2]");
        assert_eq!(ctx.to_string(), "[职位 7 文件#7 (2/2)]");
    }
}
