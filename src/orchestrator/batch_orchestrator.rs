//! 批量上传编排器 - 编排层
//!
//! ## 职责
//!
//! 持有一批已接受的条目，按 ItemId 顺序逐个提交，维护每个条目的状态，
//! 最后汇总为 `BatchReport`。
//!
//! ## 运行规则
//!
//! 1. **顺序提交**：同一时刻最多只有一个提交在进行，前一个有结果后才开始下一个
//! 2. **失败隔离**：单个文件失败只记录在该条目上，不会中止整个批次
//! 3. **批次级错误**：空批次、无效目标、重复 ID、已有运行，均在任何提交之前返回
//! 4. **取消**：只在两个条目之间检查；正在提交的条目会等待其结果，
//!    剩余的 Queued 条目标记为 Cancelled
//! 5. **每次运行独立的取消令牌**：空闲时调用 `cancel()` 不会影响之后的运行

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, BatchError, TransitionError};
use crate::infrastructure::{Destination, SubmissionChannel};
use crate::models::{
    AcceptedItem, BatchReport, CandidateItem, ItemId, ItemOutcome, ItemState, SubmissionSummary,
};
use crate::orchestrator::intake::{intake, Intake};
use crate::orchestrator::progress::{ProgressSnapshot, ProgressView};
use crate::services::ItemValidator;
use crate::utils::logging::{log_batch_complete, log_batch_start, log_intake};
use crate::workflow::upload_flow::CANCELLED_MESSAGE;
use crate::workflow::{UploadCtx, UploadFlow, UploadResult};

/// 批量上传编排器
///
/// 每个实例同一时刻只允许一次运行。状态只由编排器修改，
/// 外部通过 [`snapshot`](Self::snapshot)、[`progress`](Self::progress)
/// 或 [`subscribe`](Self::subscribe) 只读访问。
pub struct BatchOrchestrator<C> {
    channel: C,
    flow: UploadFlow,
    progress: watch::Sender<ProgressSnapshot>,
    /// 正在进行的运行的取消令牌，空闲时为 None
    cancel: Mutex<Option<CancellationToken>>,
    running: AtomicBool,
}

impl<C: SubmissionChannel> BatchOrchestrator<C> {
    pub fn new(channel: C) -> Self {
        Self::with_flow(channel, UploadFlow::default())
    }

    pub fn with_flow(channel: C, flow: UploadFlow) -> Self {
        let (progress, _) = watch::channel(ProgressSnapshot::default());
        Self {
            channel,
            flow,
            progress,
            cancel: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// 当前每个条目的状态
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.progress.borrow().clone()
    }

    /// 当前进度投影
    pub fn progress(&self) -> ProgressView {
        ProgressView::from(&*self.progress.borrow())
    }

    /// 订阅状态变化，每次迁移后都会收到新的快照
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.subscribe()
    }

    /// 请求取消当前运行
    ///
    /// 没有运行时什么也不做，返回 false
    pub fn cancel(&self) -> bool {
        match self.cancel.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 校验候选文件并提交所有通过校验的文件
    ///
    /// 候选列表为空时直接返回 `EmptyBatch`，不做校验也不提交
    pub async fn submit(
        &self,
        candidates: Vec<CandidateItem>,
        validator: &ItemValidator,
        destination: &Destination,
    ) -> AppResult<SubmissionSummary> {
        self.submit_with_cancel(candidates, validator, destination, CancellationToken::new())
            .await
    }

    /// 与 [`submit`](Self::submit) 相同，但使用调用方提供的取消令牌
    pub async fn submit_with_cancel(
        &self,
        candidates: Vec<CandidateItem>,
        validator: &ItemValidator,
        destination: &Destination,
        token: CancellationToken,
    ) -> AppResult<SubmissionSummary> {
        if candidates.is_empty() {
            return Err(BatchError::EmptyBatch.into());
        }

        let Intake {
            accepted,
            rejections,
        } = intake(candidates, validator);
        log_intake(accepted.len(), rejections.len());

        let report = self.run_with_cancel(accepted, destination, token).await?;
        Ok(SubmissionSummary { report, rejections })
    }

    /// 按 ItemId 顺序逐个提交，返回本次运行的报告
    pub async fn run(
        &self,
        items: Vec<AcceptedItem>,
        destination: &Destination,
    ) -> AppResult<BatchReport> {
        self.run_with_cancel(items, destination, CancellationToken::new())
            .await
    }

    /// 使用调用方提供的取消令牌运行
    ///
    /// 令牌只属于这一次运行；运行开始前已被取消的令牌会让所有条目直接标记为 Cancelled
    pub async fn run_with_cancel(
        &self,
        mut items: Vec<AcceptedItem>,
        destination: &Destination,
        token: CancellationToken,
    ) -> AppResult<BatchReport> {
        if items.is_empty() {
            return Err(BatchError::EmptyBatch.into());
        }
        if !destination.is_valid() {
            return Err(AppError::invalid_destination(destination.as_str()));
        }
        let mut seen = BTreeSet::new();
        if let Some(item) = items.iter().find(|item| !seen.insert(item.id())) {
            return Err(BatchError::DuplicateItemId { item: item.id() }.into());
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BatchError::RunInProgress.into());
        }
        let _guard = RunGuard {
            running: &self.running,
            cancel: &self.cancel,
        };
        *self.cancel.lock() = Some(token.clone());

        items.sort_by_key(|item| item.id());
        let total = items.len();

        // 新的运行总是从 Queued 开始
        self.progress
            .send_replace(ProgressSnapshot::queued(items.iter().map(|item| item.id())));
        log_batch_start(total, destination.as_str());

        let mut messages: HashMap<ItemId, String> = HashMap::with_capacity(total);
        let mut next = 0;

        while next < total {
            if token.is_cancelled() {
                info!("⏹️ 收到取消请求，剩余 {} 个文件不再提交", total - next);
                break;
            }

            let item = &items[next];
            let id = item.id();
            self.transition(id, |s| s.begin_submit(id))?;

            let ctx = UploadCtx::new(destination.clone(), id, next, total);
            let result = self.flow.run(&self.channel, item, &ctx).await;

            match &result {
                UploadResult::Succeeded => self.transition(id, |s| s.succeed(id))?,
                UploadResult::Failed(reason) => {
                    self.transition(id, |s| s.fail(id, reason.clone()))?
                }
            }
            messages.insert(id, result.message());
            next += 1;
        }

        for item in &items[next..] {
            let id = item.id();
            self.transition(id, |s| s.cancel(id))?;
            messages.insert(id, CANCELLED_MESSAGE.to_string());
        }

        let snapshot = self.snapshot();
        let outcomes = items
            .iter()
            .zip(snapshot.states())
            .map(|(item, (id, state))| ItemOutcome {
                id: *id,
                name: item.name().to_string(),
                state: state.clone(),
                message: messages.remove(id),
            })
            .collect();
        let report = BatchReport::from_outcomes(outcomes);

        log_batch_complete(&report);
        Ok(report)
    }

    /// 执行一次状态迁移并通知订阅者；非法迁移不会修改快照
    fn transition<F>(&self, id: ItemId, step: F) -> Result<(), TransitionError>
    where
        F: FnOnce(&ItemState) -> Result<ItemState, TransitionError>,
    {
        let mut outcome = Ok(());
        self.progress.send_if_modified(|snapshot| {
            match snapshot.transition(id, step) {
                Ok(()) => {
                    let to = snapshot.get(id).map(ItemState::name).unwrap_or("?");
                    debug!("条目 {} -> {}", id, to);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }
}

/// 运行结束（包括 future 被丢弃）时清除取消令牌并释放运行标记
struct RunGuard<'a> {
    running: &'a AtomicBool,
    cancel: &'a Mutex<Option<CancellationToken>>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.cancel.lock() = None;
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ScriptedChannel;
    use crate::models::ContentKind;
    use crate::services::ValidationPolicy;
    use crate::workflow::upload_flow::SUCCESS_MESSAGE;
    use std::sync::Arc;
    use std::time::Duration;

    fn accepted(n: usize) -> Vec<AcceptedItem> {
        (0..n)
            .map(|i| {
                AcceptedItem::new(
                    ItemId(i),
                    CandidateItem::from_bytes(
                        format!("cv_{}.pdf", i),
                        ContentKind::pdf(),
                        vec![0u8; 64],
                    ),
                )
            })
            .collect()
    }

    fn dest() -> Destination {
        Destination::new("42")
    }

    async fn wait_in_flight(channel: &ScriptedChannel) {
        for _ in 0..200 {
            if channel.in_flight_count() == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("提交一直没有开始");
    }

    #[tokio::test]
    async fn test_all_succeed_in_order() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());

        let report = orchestrator.run(accepted(4), &dest()).await.unwrap();

        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.failed(), 0);
        let ids: Vec<_> = report.items().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(report.items()[0].message.as_deref(), Some(SUCCESS_MESSAGE));

        let called: Vec<_> = channel.calls().iter().map(|c| c.id.0).collect();
        assert_eq!(called, vec![0, 1, 2, 3]);
        assert_eq!(channel.max_in_flight(), 1);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_single_failure_is_isolated_at_every_index() {
        for failing in 0..3 {
            let channel = ScriptedChannel::new();
            channel.fail(&format!("cv_{}.pdf", failing), "Job not found");
            let orchestrator = BatchOrchestrator::new(channel.clone());

            let report = orchestrator.run(accepted(3), &dest()).await.unwrap();

            assert_eq!(channel.call_count(), 3);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.succeeded(), 2);
            for outcome in report.items() {
                if outcome.id.0 == failing {
                    assert_eq!(
                        outcome.state,
                        ItemState::Failed {
                            reason: "Job not found".to_string()
                        }
                    );
                    assert_eq!(outcome.message.as_deref(), Some("Job not found"));
                } else {
                    assert_eq!(outcome.state, ItemState::Succeeded);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_run_level_errors_skip_channel() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());

        let err = orchestrator.run(Vec::new(), &dest()).await.unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::EmptyBatch)));

        let err = orchestrator
            .run(accepted(2), &Destination::new(""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Batch(BatchError::InvalidDestination { .. })
        ));
        assert_eq!(channel.call_count(), 0);
        assert!(orchestrator.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_items() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());
        let token = CancellationToken::new();
        let handle = token.clone();
        // 在 cv_1 提交期间请求取消，cv_1 有结果后、cv_2 开始前生效
        channel.on_submit("cv_1.pdf", move || handle.cancel());

        let report = orchestrator
            .run_with_cancel(accepted(5), &dest(), token)
            .await
            .unwrap();

        assert_eq!(channel.call_count(), 2);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.cancelled(), 3);
        for outcome in &report.items()[2..] {
            assert_eq!(outcome.state, ItemState::Cancelled);
            assert_eq!(outcome.message.as_deref(), Some(CANCELLED_MESSAGE));
        }

        // 取消只影响那一次运行
        let report = orchestrator.run(accepted(2), &dest()).await.unwrap();
        assert_eq!(report.succeeded(), 2);
    }

    #[tokio::test]
    async fn test_cancel_before_first_item() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());
        let token = CancellationToken::new();
        token.cancel();

        let report = orchestrator
            .run_with_cancel(accepted(3), &dest(), token)
            .await
            .unwrap();

        assert_eq!(channel.call_count(), 0);
        assert_eq!(report.total(), 3);
        assert_eq!(report.cancelled(), 3);
        assert!(report
            .items()
            .iter()
            .all(|o| o.message.as_deref() == Some(CANCELLED_MESSAGE)));
    }

    #[tokio::test]
    async fn test_cancel_after_item_resolved() {
        let channel = ScriptedChannel::new();
        let gate = channel.gate("cv_2.pdf");
        let orchestrator = Arc::new(BatchOrchestrator::new(channel.clone()));
        let mut rx = orchestrator.subscribe();

        let runner = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let destination = dest();
                orchestrator.run(accepted(5), &destination).await
            })
        };

        // 等到 cv_1 已经成功，再请求取消
        rx.wait_for(|s| s.get(ItemId(1)) == Some(&ItemState::Succeeded))
            .await
            .unwrap();
        assert!(orchestrator.cancel());
        gate.send(()).unwrap();

        let report = runner.await.unwrap().unwrap();
        let states: Vec<_> = report.items().iter().map(|o| o.state.clone()).collect();
        assert_eq!(
            states,
            vec![
                ItemState::Succeeded,
                ItemState::Succeeded,
                ItemState::Succeeded,
                ItemState::Cancelled,
                ItemState::Cancelled,
            ]
        );
        assert_eq!(channel.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cancel_when_idle_does_not_affect_next_run() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());

        assert!(!orchestrator.cancel());
        assert_eq!(orchestrator.run(accepted(1), &dest()).await.unwrap().succeeded(), 1);

        // 运行结束后再取消，不会带到下一次运行
        assert!(!orchestrator.cancel());
        let report = orchestrator.run(accepted(2), &dest()).await.unwrap();
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.cancelled(), 0);
        assert_eq!(channel.call_count(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_refused_before_submitting() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());
        let validator = ItemValidator::new(ValidationPolicy::new(["application/pdf"], 1024));
        let file = |name: &str| CandidateItem::from_bytes(name, ContentKind::pdf(), vec![0u8; 8]);

        // 两次独立 intake 的结果拼在一起，ID 都从 0 开始
        let mut items = intake(vec![file("a.pdf"), file("b.pdf")], &validator).accepted;
        items.extend(intake(vec![file("c.pdf")], &validator).accepted);

        let err = orchestrator.run(items, &dest()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Batch(BatchError::DuplicateItemId { item: ItemId(0) })
        ));
        assert_eq!(channel.call_count(), 0);
        assert!(orchestrator.snapshot().is_empty());
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_sparse_ids_are_numbered_by_position() {
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());
        let items = vec![
            AcceptedItem::new(
                ItemId(7),
                CandidateItem::from_bytes("late.pdf", ContentKind::pdf(), vec![0u8; 8]),
            ),
            AcceptedItem::new(
                ItemId(2),
                CandidateItem::from_bytes("early.pdf", ContentKind::pdf(), vec![0u8; 8]),
            ),
        ];

        let report = orchestrator.run(items, &dest()).await.unwrap();

        assert_eq!(report.succeeded(), 2);
        let names: Vec<_> = channel.calls().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["early.pdf".to_string(), "late.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_while_submitting_waits_for_in_flight() {
        let channel = ScriptedChannel::new();
        let gate = channel.gate("cv_1.pdf");
        let orchestrator = Arc::new(BatchOrchestrator::new(channel.clone()));

        let runner = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let destination = dest();
                orchestrator.run(accepted(3), &destination).await
            })
        };

        wait_in_flight(&channel).await;
        let snap = orchestrator.snapshot();
        assert_eq!(snap.get(ItemId(0)), Some(&ItemState::Succeeded));
        assert_eq!(snap.get(ItemId(1)), Some(&ItemState::Submitting));
        assert_eq!(snap.get(ItemId(2)), Some(&ItemState::Queued));

        assert!(orchestrator.cancel());
        // 在途的提交仍未结束
        assert_eq!(
            orchestrator.snapshot().get(ItemId(1)),
            Some(&ItemState::Submitting)
        );
        gate.send(()).unwrap();

        let report = runner.await.unwrap().unwrap();
        assert_eq!(report.get(ItemId(1)).unwrap().state, ItemState::Succeeded);
        assert_eq!(report.get(ItemId(2)).unwrap().state, ItemState::Cancelled);
        assert_eq!(channel.call_count(), 2);
    }

    #[tokio::test]
    async fn test_second_run_is_refused_while_running() {
        let channel = ScriptedChannel::new();
        let gate = channel.gate("cv_0.pdf");
        let orchestrator = Arc::new(BatchOrchestrator::new(channel.clone()));

        let runner = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let destination = dest();
                orchestrator.run(accepted(1), &destination).await
            })
        };
        wait_in_flight(&channel).await;

        let err = orchestrator.run(accepted(1), &dest()).await.unwrap_err();
        assert!(matches!(err, AppError::Batch(BatchError::RunInProgress)));

        drop(gate);
        assert_eq!(runner.await.unwrap().unwrap().succeeded(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_idempotent_and_observations_are_monotonic() {
        let channel = ScriptedChannel::new();
        channel.fail("cv_1.pdf", "boom");
        let orchestrator = BatchOrchestrator::new(channel);
        let mut rx = orchestrator.subscribe();

        let observer = async {
            let mut seen = Vec::new();
            loop {
                let view = ProgressView::from(&*rx.borrow_and_update());
                let done = view.is_complete();
                if !view.entries.is_empty() {
                    seen.push(view);
                }
                if done || rx.changed().await.is_err() {
                    break;
                }
            }
            seen
        };

        let destination = dest();
        let (report, seen) = tokio::join!(orchestrator.run(accepted(3), &destination), observer);
        let report = report.unwrap();

        for pair in seen.windows(2) {
            assert!(pair[1].is_successor_of(&pair[0]));
        }
        assert_eq!(orchestrator.snapshot(), orchestrator.snapshot());
        // 3 个条目，每个两次迁移
        assert_eq!(orchestrator.snapshot().transitions(), 6);
        assert_eq!(orchestrator.progress().failed, report.failed());
    }

    #[tokio::test]
    async fn test_submit_with_rejections() {
        const MB: usize = 1024 * 1024;
        let channel = ScriptedChannel::new();
        let orchestrator = BatchOrchestrator::new(channel.clone());
        let policy = ValidationPolicy::new(["application/pdf"], (10 * MB) as u64);
        let validator = ItemValidator::new(policy);

        let candidates = vec![
            CandidateItem::from_bytes("a.pdf", ContentKind::pdf(), vec![0u8; 1024]),
            CandidateItem::from_bytes("b.pdf", ContentKind::pdf(), vec![0u8; 1024]),
            CandidateItem::from_bytes("c.pdf", ContentKind::pdf(), vec![0u8; 20 * MB]),
        ];

        let summary = orchestrator
            .submit(candidates, &validator, &dest())
            .await
            .unwrap();

        assert_eq!(summary.report.succeeded(), 2);
        assert_eq!(summary.report.failed(), 0);
        assert!(summary.report.items().iter().all(|o| o.name != "c.pdf"));
        assert_eq!(summary.rejections.len(), 1);
        assert_eq!(summary.rejections[0].reason.as_str(), "too-large");
    }
}
