use crate::models::candidate::{CandidateItem, ContentKind, PayloadHandle};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从单个文件创建候选条目（只读取元数据，不读取内容）
pub async fn load_candidate(file_path: &Path) -> Result<CandidateItem> {
    let metadata = fs::metadata(file_path)
        .await
        .with_context(|| format!("无法读取文件信息: {}", file_path.display()))?;

    let name = file_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let kind = ContentKind::from_file_name(&name);

    Ok(CandidateItem::new(
        name,
        metadata.len(),
        kind,
        PayloadHandle::File(file_path.to_path_buf()),
    ))
}

/// 扫描文件夹，把其中所有普通文件转换为候选条目
///
/// 按文件名排序，保证每次运行的提交顺序一致
pub async fn load_candidates(folder_path: &str) -> Result<Vec<CandidateItem>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        match load_candidate(&path).await {
            Ok(candidate) => {
                tracing::info!(
                    "发现文件: {} ({})",
                    candidate.name(),
                    crate::utils::logging::format_file_size(candidate.size())
                );
                candidates.push(candidate);
            }
            Err(e) => {
                tracing::warn!("读取文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(candidates)
}
