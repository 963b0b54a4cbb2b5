//! 应用入口 - 管理配置、日志和资源的生命周期

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, BatchError};
use crate::infrastructure::{Destination, HttpChannel};
use crate::models::{load_candidates, SubmissionSummary};
use crate::orchestrator::BatchOrchestrator;
use crate::services::{FailureWriter, ItemValidator, ValidationPolicy};
use crate::utils::logging;
use crate::workflow::UploadFlow;

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: BatchOrchestrator<HttpChannel>,
    validator: ItemValidator,
    failure_writer: FailureWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config.job_id, config.max_bytes, &config.allowed_kinds);

        let channel = HttpChannel::new(&config).context("无法创建 HTTP 客户端")?;

        // 服务不可用时只提示，不阻止运行；每个文件的失败会单独记录
        match channel.health_check().await {
            Ok(status) => info!("✓ 服务可用: {}", status),
            Err(e) => warn!("⚠️ 健康检查失败: {}", e),
        }

        let orchestrator =
            BatchOrchestrator::with_flow(channel, UploadFlow::new(config.verbose_logging));

        Ok(Self {
            validator: ItemValidator::new(ValidationPolicy::from(&config)),
            failure_writer: FailureWriter::with_path(config.failure_log_file.clone()),
            orchestrator,
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<Option<SubmissionSummary>> {
        info!("\n📁 正在扫描待上传的文件...");
        let candidates = load_candidates(&self.config.upload_folder).await?;
        let destination = Destination::new(self.config.job_id.trim());

        // Ctrl-C 只阻止后续文件开始上传，正在上传的文件会等待结果
        let token = CancellationToken::new();
        let ctrl_c = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("⏹️ 收到 Ctrl-C，当前文件完成后停止");
                    token.cancel();
                }
            })
        };

        let result = self
            .orchestrator
            .submit_with_cancel(candidates, &self.validator, &destination, token)
            .await;
        ctrl_c.abort();

        let summary = match result {
            Ok(summary) => summary,
            Err(AppError::Batch(BatchError::EmptyBatch)) => {
                warn!("⚠️ 没有可上传的文件，程序结束");
                return Ok(None);
            }
            Err(e) => {
                error!("❌ 批次无法开始: {}", e);
                return Err(e.into());
            }
        };

        self.record(&destination, &summary).await?;

        logging::print_final_stats(
            &summary.report,
            summary.rejections.len(),
            &self.config.output_log_file,
        );

        Ok(Some(summary))
    }

    /// 写入失败记录和报告文件
    async fn record(&self, destination: &Destination, summary: &SubmissionSummary) -> Result<()> {
        let dest = destination.as_str();
        let rejected = self
            .failure_writer
            .write_rejections(dest, &summary.rejections)
            .await?;
        let failed = self
            .failure_writer
            .write_report(dest, &summary.report)
            .await?;
        if rejected + failed > 0 {
            info!(
                "📝 {} 条失败记录已写入 {}",
                rejected + failed,
                self.config.failure_log_file
            );
        }

        if let Some(report_file) = &self.config.report_file {
            let json = serde_json::to_string_pretty(summary)?;
            tokio::fs::write(report_file, json)
                .await
                .with_context(|| format!("无法写入报告文件: {}", report_file))?;
            info!("📄 报告已保存至: {}", report_file);
        }

        Ok(())
    }
}
