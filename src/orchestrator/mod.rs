//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量上传的调度和状态管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `intake` - 文件接收
//! - 逐个校验候选文件
//! - 为通过校验的文件分配连续的 ItemId
//!
//! ### `batch_orchestrator` - 批量上传编排器
//! - 按 ItemId 顺序逐个提交
//! - 维护每个条目的状态机
//! - 支持在两个条目之间取消
//! - 汇总批次报告
//!
//! ### `progress` - 进度快照与投影
//! - 只读的状态视图
//! - 累计计数
//!
//! ## 层次关系
//!
//! ```text
//! batch_orchestrator (处理 Vec<AcceptedItem>)
//!     ↓
//! workflow::UploadFlow (处理单个文件)
//!     ↓
//! infrastructure (提交通道：HttpChannel)
//! ```

pub mod batch_orchestrator;
pub mod intake;
pub mod progress;

// 重新导出主要类型
pub use batch_orchestrator::BatchOrchestrator;
pub use intake::{intake, Intake};
pub use progress::{ProgressSnapshot, ProgressView};
