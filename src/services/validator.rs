//! 文件校验服务 - 业务能力层
//!
//! 只根据声明的类型和大小判断，不读取文件内容

use std::collections::HashSet;

use crate::config::Config;
use crate::error::RejectReason;
use crate::models::{CandidateItem, ContentKind};

/// 校验策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub allowed_kinds: HashSet<ContentKind>,
    pub max_bytes: u64,
}

impl ValidationPolicy {
    pub fn new<I, S>(allowed_kinds: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_kinds: allowed_kinds.into_iter().map(ContentKind::new).collect(),
            max_bytes,
        }
    }
}

impl From<&Config> for ValidationPolicy {
    fn from(config: &Config) -> Self {
        Self::new(config.allowed_kinds.iter().cloned(), config.max_bytes)
    }
}

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

/// 文件校验服务
///
/// 规则按顺序执行，第一条不满足的规则决定拒绝原因：
/// 1. 类型必须在允许列表中
/// 2. 大小不能超过上限
#[derive(Debug, Clone)]
pub struct ItemValidator {
    policy: ValidationPolicy,
}

impl ItemValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn validate(&self, candidate: &CandidateItem) -> Verdict {
        if !self.policy.allowed_kinds.contains(candidate.kind()) {
            return Verdict::Rejected(RejectReason::UnsupportedType);
        }
        if candidate.size() > self.policy.max_bytes {
            return Verdict::Rejected(RejectReason::TooLarge);
        }
        Verdict::Accepted
    }
}
