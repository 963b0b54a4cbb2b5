//! # Bulk Resume Submit
//!
//! 把一批简历文件逐个上传到同一个职位的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP Client），只暴露"提交一个文件"的能力
//! - `SubmissionChannel` - 提交通道抽象
//! - `HttpChannel` - 基于 reqwest 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 只处理单个文件
//! - `ItemValidator` - 按类型和大小校验
//! - `FailureWriter` - 写 failed.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的上传流程
//! - `UploadCtx` - 上下文封装（职位 + 条目）
//! - `UploadFlow` - 提交并把结果转换为成功/失败
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/intake` - 校验候选文件并分配 ItemId
//! - `orchestrator/batch_orchestrator` - 顺序提交、状态机、取消、报告
//! - `orchestrator/progress` - 只读的进度快照与投影
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, BatchError, RejectReason};
pub use infrastructure::{Destination, HttpChannel, SubmissionChannel, SubmitOutcome};
pub use models::{AcceptedItem, BatchReport, CandidateItem, ContentKind, ItemId, ItemState};
pub use orchestrator::{BatchOrchestrator, ProgressSnapshot, ProgressView};
pub use services::{ItemValidator, ValidationPolicy};
pub use workflow::{UploadCtx, UploadFlow, UploadResult};
