//! WorkQueue - BoundedTask を逐次（width=1）または並列（width=N）で実行するスケジューラ
//!
//! # 設計
//! - width 本のワーカーが 1 本の FIFO チャネルから unit を取り出す
//! - unit は `spawn_blocking` 上で `run()` する（ゲート待ちでブロックするため）
//! - ワーカーは unit が終わるまで次を取らない。同時に飛ぶリモート呼び出しは width 本まで
//! - `cancel_all()` は投入済みで未完了の unit すべてのキャンセルフラグを立てる

mod counts;

pub use self::counts::QueueCounts;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

use crate::domain::{BoundWaitError, TaskId};
use crate::task::{BoundedTask, CancelToken};

/// Something a [`WorkQueue`] can run once on a blocking thread.
pub trait UnitOfWork: Send + 'static {
    fn id(&self) -> TaskId;

    fn cancel_token(&self) -> CancelToken;

    fn run(self: Box<Self>);
}

impl<P: Send + 'static> UnitOfWork for BoundedTask<P> {
    fn id(&self) -> TaskId {
        BoundedTask::id(self)
    }

    fn cancel_token(&self) -> CancelToken {
        BoundedTask::cancel_token(self)
    }

    fn run(self: Box<Self>) {
        BoundedTask::run(*self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of units allowed to run at once. 1 = sequential.
    pub width: usize,
}

impl QueueConfig {
    pub fn sequential() -> Self {
        Self { width: 1 }
    }

    pub fn concurrent(width: usize) -> Self {
        Self { width }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

type Job = Box<dyn UnitOfWork>;

#[derive(Default)]
struct QueueState {
    queued: AtomicUsize,
    running: AtomicUsize,
    finished: AtomicUsize,
    tokens: Mutex<HashMap<TaskId, CancelToken>>,
    idle: Notify,
}

impl QueueState {
    fn tokens(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, CancelToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> usize {
        self.queued.load(Ordering::Acquire) + self.running.load(Ordering::Acquire)
    }
}

/// Fixed-width pool of workers running units of work in submission order.
pub struct WorkQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    state: Arc<QueueState>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkQueue {
    pub fn new(config: QueueConfig, handle: &Handle) -> Result<Self, BoundWaitError> {
        if config.width == 0 {
            return Err(BoundWaitError::ZeroWidth);
        }

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let state = Arc::new(QueueState::default());

        let mut workers = Vec::with_capacity(config.width);
        for worker_id in 0..config.width {
            let rx = Arc::clone(&rx);
            let state = Arc::clone(&state);
            workers.push(handle.spawn(worker_loop(worker_id, rx, state)));
        }

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            state,
            workers,
        })
    }

    pub fn width(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a unit. Fails once the queue has been shut down.
    pub fn submit(&self, unit: Box<dyn UnitOfWork>) -> Result<TaskId, BoundWaitError> {
        let id = unit.id();
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = tx.as_ref() else {
            return Err(BoundWaitError::QueueClosed);
        };

        self.state.tokens().insert(id, unit.cancel_token());
        self.state.queued.fetch_add(1, Ordering::AcqRel);
        if tx.send(unit).is_err() {
            self.state.queued.fetch_sub(1, Ordering::AcqRel);
            self.state.tokens().remove(&id);
            return Err(BoundWaitError::QueueClosed);
        }
        tracing::debug!(task_id = %id, "unit submitted");
        Ok(id)
    }

    pub fn submit_task<P: Send + 'static>(
        &self,
        task: BoundedTask<P>,
    ) -> Result<TaskId, BoundWaitError> {
        self.submit(Box::new(task))
    }

    /// Cancel one submitted unit that has not finished yet.
    pub fn cancel(&self, id: TaskId) -> bool {
        let token = self.state.tokens().get(&id).cloned();
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every submitted unit that has not finished yet.
    pub fn cancel_all(&self) {
        let tokens: Vec<CancelToken> = self.state.tokens().values().cloned().collect();
        tracing::info!(count = tokens.len(), "cancelling all units");
        for token in tokens {
            token.cancel();
        }
    }

    pub fn counts(&self) -> QueueCounts {
        QueueCounts {
            queued: self.state.queued.load(Ordering::Acquire),
            running: self.state.running.load(Ordering::Acquire),
            finished: self.state.finished.load(Ordering::Acquire),
        }
    }

    /// Wait until every submitted unit has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.state.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting units. Already queued units still run.
    pub fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Close, drain the queue, and wait for all workers to exit.
    pub async fn shutdown_and_join(self) {
        self.close();
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
    state: Arc<QueueState>,
) {
    loop {
        // lock only while receiving so idle workers queue up behind the receiver
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        let id = job.id();
        // running first so pending() never dips to zero mid-handoff
        state.running.fetch_add(1, Ordering::AcqRel);
        state.queued.fetch_sub(1, Ordering::AcqRel);

        if let Err(e) = tokio::task::spawn_blocking(move || job.run()).await {
            tracing::error!(worker_id, task_id = %id, error = %e, "unit of work panicked");
        }

        state.tokens().remove(&id);
        state.running.fetch_sub(1, Ordering::AcqRel);
        state.finished.fetch_add(1, Ordering::AcqRel);
        state.idle.notify_waiters();
    }
    tracing::debug!(worker_id, "worker stopped");
}
