//! 内存提交通道，用于测试
//!
//! 可以按文件名预设失败、在提交时执行回调，或让某个文件一直等待直到被触发

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::infrastructure::submission_channel::{Destination, SubmissionChannel, SubmitOutcome};
use crate::models::{AcceptedItem, ItemId};

type Hook = Arc<dyn Fn() + Send + Sync>;

/// 一次提交调用的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCall {
    pub id: ItemId,
    pub name: String,
    pub destination: String,
}

/// 按脚本返回结果的提交通道，默认全部成功
#[derive(Clone, Default)]
pub struct ScriptedChannel {
    failures: Arc<Mutex<HashMap<String, String>>>,
    hooks: Arc<Mutex<HashMap<String, Hook>>>,
    gates: Arc<Mutex<HashMap<String, oneshot::Receiver<()>>>>,
    calls: Arc<Mutex<Vec<SubmitCall>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定文件提交时返回失败
    pub fn fail(&self, name: &str, message: &str) {
        self.failures
            .lock()
            .insert(name.to_string(), message.to_string());
    }

    /// 指定文件提交时（返回结果之前）执行回调
    pub fn on_submit(&self, name: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks.lock().insert(name.to_string(), Arc::new(hook));
    }

    /// 指定文件的提交会一直挂起，直到返回的 sender 发送或被丢弃
    pub fn gate(&self, name: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(name.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<SubmitCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 观察到的最大同时提交数
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubmissionChannel for ScriptedChannel {
    async fn submit(&self, item: &AcceptedItem, destination: &Destination) -> SubmitOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        self.calls.lock().push(SubmitCall {
            id: item.id(),
            name: item.name().to_string(),
            destination: destination.to_string(),
        });

        let hook = self.hooks.lock().get(item.name()).cloned();
        if let Some(hook) = hook {
            hook();
        }

        let gate = self.gates.lock().remove(item.name());
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match self.failures.lock().get(item.name()) {
            Some(message) => SubmitOutcome::Failure(message.clone()),
            None => SubmitOutcome::Success,
        }
    }
}
