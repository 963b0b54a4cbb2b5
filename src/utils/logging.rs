use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::BatchReport;

/// 初始化 tracing 日志，默认级别 info，可通过 RUST_LOG 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n简历批量上传日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(job_id: &str, max_bytes: u64, allowed_kinds: &[String]) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 简历批量上传模式");
    info!("🎯 目标职位: {}", job_id);
    info!("📏 单文件上限: {}", format_file_size(max_bytes));
    info!("📄 允许类型: {}", allowed_kinds.join(", "));
    info!("{}", "=".repeat(60));
}

/// 记录文件扫描结果
///
/// # 参数
/// - `accepted`: 通过校验的数量
/// - `rejected`: 被拒绝的数量
pub fn log_intake(accepted: usize, rejected: usize) {
    info!("✓ 通过校验 {} 个文件", accepted);
    if rejected > 0 {
        info!("⚠️ 有 {} 个文件未通过校验，不会上传", rejected);
    }
    info!("💡 文件将逐个上传，一个完成后再开始下一个\n");
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, destination: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始上传 {} 个文件到职位 {}", total, destination);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(report: &BatchReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次完成: 成功 {}/{}，失败 {}，取消 {}",
        report.succeeded(),
        report.total(),
        report.failed(),
        report.cancelled()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 批次报告
/// - `rejected`: 校验未通过的数量
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &BatchReport, rejected: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for outcome in report.items() {
        let icon = match outcome.state {
            crate::models::ItemState::Succeeded => "✅",
            crate::models::ItemState::Cancelled => "⏹️",
            _ => "❌",
        };
        info!(
            "{} {} {}",
            icon,
            outcome.name,
            outcome.message.as_deref().unwrap_or_default()
        );
    }
    info!("{}", "─".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded(), report.total());
    info!("❌ 失败: {}", report.failed());
    info!("⏹️ 取消: {}", report.cancelled());
    info!("🚫 未通过校验: {}", rejected);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 把字节数格式化为易读的大小
///
/// 例如 `0 Bytes`、`1.5 KB`、`10 MB`
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("简历上传", 10), "简历上传");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
    }

    #[test]
    fn test_init_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        init_log_file(path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("简历批量上传日志"));
    }
}
