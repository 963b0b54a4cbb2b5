//! 候选文件 - 校验之前的原始输入

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

/// 内容类型（MIME）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentKind(String);

impl ContentKind {
    pub const PDF: &'static str = "application/pdf";
    pub const OCTET_STREAM: &'static str = "application/octet-stream";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into().trim().to_ascii_lowercase())
    }

    pub fn pdf() -> Self {
        Self::new(Self::PDF)
    }

    /// 根据文件扩展名推断类型，未知扩展名返回 octet-stream
    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());

        let kind = match ext.as_deref() {
            Some("pdf") => Self::PDF,
            Some("doc") => "application/msword",
            Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Some("txt") => "text/plain",
            _ => Self::OCTET_STREAM,
        };
        Self::new(kind)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 未声明或只声明了通用二进制类型
    fn is_unspecified(&self) -> bool {
        self.0.is_empty() || self.0 == Self::OCTET_STREAM
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 文件内容句柄，编排器不关心其中内容
#[derive(Debug, Clone)]
pub enum PayloadHandle {
    /// 磁盘上的文件，提交时才读取
    File(PathBuf),
    /// 内存中的数据
    Memory(Arc<[u8]>),
}

/// 候选文件
///
/// 创建后不可变。`kind` 为声明的内容类型；如果没有声明具体类型，
/// 则按文件名推断（`.pdf` 结尾的文件视为 PDF）。
#[derive(Debug, Clone)]
pub struct CandidateItem {
    name: String,
    size: u64,
    kind: ContentKind,
    payload: PayloadHandle,
}

impl CandidateItem {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        kind: ContentKind,
        payload: PayloadHandle,
    ) -> Self {
        let name = name.into();
        let kind = if kind.is_unspecified() {
            ContentKind::from_file_name(&name)
        } else {
            kind
        };
        Self {
            name,
            size,
            kind,
            payload,
        }
    }

    /// 从内存数据创建候选文件，大小取数据长度
    pub fn from_bytes(
        name: impl Into<String>,
        kind: ContentKind,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        let size = bytes.len() as u64;
        Self::new(name, size, kind, PayloadHandle::Memory(bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn kind(&self) -> &ContentKind {
        &self.kind
    }

    pub fn payload(&self) -> &PayloadHandle {
        &self.payload
    }
}
