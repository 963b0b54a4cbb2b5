//! 上传上下文
//!
//! 封装"我正在把第几个文件提交到哪个职位"这一信息

use std::fmt::Display;

use crate::infrastructure::Destination;
use crate::models::ItemId;

/// 单个文件的上传上下文
#[derive(Debug, Clone)]
pub struct UploadCtx {
    /// 提交目标
    pub destination: Destination,

    /// 条目 ID
    pub item_id: ItemId,

    /// 在本批次中的位置（从 0 开始）
    pub position: usize,

    /// 本批次条目总数（仅用于日志显示）
    pub total: usize,
}

impl UploadCtx {
    pub fn new(destination: Destination, item_id: ItemId, position: usize, total: usize) -> Self {
        Self {
            destination,
            item_id,
            position,
            total,
        }
    }

    /// 日志前缀，例如 `[文件 2/5]`
    pub fn tag(&self) -> String {
        format!("[文件 {}/{}]", self.position + 1, self.total)
    }
}

impl Display for UploadCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[职位 {} 文件{} ({}/{})]",
            self.destination,
            self.item_id,
            self.position + 1,
            self.total
        )
    }
}
