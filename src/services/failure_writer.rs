//! 失败记录服务 - 业务能力层
//!
//! 只负责"写 failed.txt"能力，不关心流程

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::{BatchReport, ItemState, Rejection};

/// 失败记录服务
///
/// 职责：
/// - 将上传失败、被取消或校验未通过的文件追加写入记录文件
/// - 不修改批次报告
pub struct FailureWriter {
    file_path: String,
}

impl FailureWriter {
    /// 写入指定路径的记录文件
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    /// 写入一条记录
    pub async fn write(&self, destination: &str, name: &str, reason: &str) -> Result<()> {
        debug!("写入失败记录: 职位 {} | 文件 {} | 原因 {}", destination, name, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await
            .with_context(|| format!("无法打开记录文件: {}", self.file_path))?;

        let line = format!("职位 {} | 文件 {} | 原因: {}\n", destination, name, reason);
        file.write_all(line.as_bytes()).await?;

        Ok(())
    }

    /// 写入校验拒绝记录
    pub async fn write_rejections(
        &self,
        destination: &str,
        rejections: &[Rejection],
    ) -> Result<usize> {
        for rejection in rejections {
            self.write(destination, &rejection.name, rejection.reason.as_str())
                .await?;
        }
        Ok(rejections.len())
    }

    /// 写入报告中所有未成功的条目，返回写入条数
    pub async fn write_report(&self, destination: &str, report: &BatchReport) -> Result<usize> {
        let mut written = 0;
        for outcome in report.items() {
            let reason = match &outcome.state {
                ItemState::Failed { reason } => reason.as_str(),
                ItemState::Cancelled => "cancelled",
                _ => continue,
            };
            self.write(destination, &outcome.name, reason).await?;
            written += 1;
        }
        Ok(written)
    }
}
