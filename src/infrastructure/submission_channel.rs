//! 提交通道抽象 - 基础设施层
//!
//! 编排器只依赖"提交一个文件，得到成功或失败"这一能力

use std::fmt;

use async_trait::async_trait;

use crate::models::AcceptedItem;

/// 提交目标（职位 ID）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 目标会被拼进 URL 路径，只允许非空的字母、数字、`-`、`_`
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单次提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success,
    Failure(String),
}

/// 提交通道
///
/// 每次调用只提交一个文件，不做批量或流水线；并发由编排器控制。
/// 所有失败（网络、服务端校验、认证失效）都以 `Failure(message)` 返回。
#[async_trait]
pub trait SubmissionChannel: Send + Sync {
    async fn submit(&self, item: &AcceptedItem, destination: &Destination) -> SubmitOutcome;
}
