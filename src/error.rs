use serde::Serialize;
use thiserror::Error;

use crate::models::ItemId;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 批次级错误（整个运行无法开始）
    #[error("批次错误: {0}")]
    Batch(#[from] BatchError),
    /// 提交通道错误
    #[error("提交通道错误: {0}")]
    Channel(#[from] ChannelError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 状态迁移错误
    #[error("状态错误: {0}")]
    Transition(#[from] TransitionError),
}

/// 批次级错误
///
/// 这些错误会阻止整个运行开始，发生时不会调用提交通道。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// 没有可提交的条目
    #[error("批次为空，没有可提交的文件")]
    EmptyBatch,
    /// 目标引用无效
    #[error("无效的提交目标: '{destination}'")]
    InvalidDestination { destination: String },
    /// 同一批次中有重复的条目 ID
    #[error("条目 ID {item} 重复")]
    DuplicateItemId { item: ItemId },
    /// 同一个编排器上已有运行在进行
    #[error("已有批次正在运行")]
    RunInProgress,
}

/// 校验拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// 文件类型不在允许列表中
    #[error("unsupported-type")]
    UnsupportedType,
    /// 文件大小超过上限
    #[error("too-large")]
    TooLarge,
}

impl RejectReason {
    /// 面向调用方的诊断代码
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::UnsupportedType => "unsupported-type",
            RejectReason::TooLarge => "too-large",
        }
    }
}

/// 提交通道错误
///
/// 单个条目的失败只会被记录，不会升级为批次级错误。
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务端返回错误响应
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// 读取待上传文件失败
    #[error("无法读取文件 {path}: {source}")]
    PayloadUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 构建请求失败
    #[error("构建请求失败: {0}")]
    InvalidRequest(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值无效
    #[error("配置项 {key} 的值无效: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// 非法的状态迁移
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("条目 {item} 无法从 {from} 迁移到 {to}")]
pub struct TransitionError {
    pub item: ItemId,
    pub from: &'static str,
    pub to: &'static str,
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建无效目标错误
    pub fn invalid_destination(destination: impl Into<String>) -> Self {
        AppError::Batch(BatchError::InvalidDestination {
            destination: destination.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
