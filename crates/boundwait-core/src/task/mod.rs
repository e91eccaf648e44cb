//! BoundedTask - コールバック完了型の呼び出しを、タイムアウト付きの同期待ちに変換する
//!
//! # フロー
//! 1. `run()` 入口でキャンセル済みなら即 Failure（呼び出しも待機もしない）
//! 2. payload が無ければ Failure、到達不能なら Failure（タイマーも張らない）
//! 3. タイムアウトガードを張り、リモート呼び出しを発行し、ゲートで待つ
//! 4. {成功, 失敗, タイムアウト, キャンセル} のうち最初の 1 つだけが決着をつける
//! 5. ゲートが開いたら Status を確定し、observer に 1 回だけ渡して `run()` から戻る
//!
//! `run()` は呼び出し中ずっと実行スレッドを占有する。プールの幅がそのまま
//! 同時に飛ぶリモート呼び出し数の上限になる。

mod builder;
mod cancel;
mod config;
mod gate;
mod guard;

pub use self::builder::BoundedTaskBuilder;
pub use self::cancel::CancelToken;
pub use self::config::TaskConfig;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{Completion, FailureReason, TaskId};
use crate::impls::{AlwaysReachable, ThreadTimer};
use crate::ports::{
    CallCompletion, Clock, Connectivity, IdGenerator, RemoteClient, ResultObserver, SystemClock,
    Timer,
};

use self::gate::{GateSignal, Verdict};
use self::guard::TimeoutGuard;

/// One unit of work performing exactly one remote call with a hard deadline.
///
/// Created per payload, run once, then discarded: `run` consumes the task.
pub struct BoundedTask<P> {
    id: TaskId,
    payload: Option<P>,
    config: TaskConfig,
    cancel: CancelToken,
    observer: Box<dyn ResultObserver<P>>,
    client: Arc<dyn RemoteClient<P>>,
    connectivity: Arc<dyn Connectivity>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
}

impl<P: Send + 'static> BoundedTask<P> {
    /// Task with default config, always-reachable connectivity and a thread-backed timer.
    ///
    /// Use [`BoundedTask::builder`] to supply the other collaborators.
    pub fn new(
        payload: impl Into<Option<P>>,
        observer: impl ResultObserver<P> + 'static,
        client: Arc<dyn RemoteClient<P>>,
    ) -> Self {
        Self {
            id: builder::default_ids().generate_task_id(),
            payload: payload.into(),
            config: TaskConfig::default(),
            cancel: CancelToken::new(),
            observer: Box::new(observer),
            client,
            connectivity: Arc::new(AlwaysReachable),
            timer: Arc::new(ThreadTimer::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn builder() -> BoundedTaskBuilder<P> {
        BoundedTaskBuilder::new()
    }
}

impl<P> BoundedTask<P> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token sharing this task's cancellation flag, for use after the task is handed off.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Scheduler entry point. Blocks until the task has settled and its observer has run.
    ///
    /// # Panics
    /// If invoked from inside an async execution context; run it on a blocking thread.
    pub fn run(self) {
        let span = tracing::info_span!("bounded_task", task_id = %self.id);
        let _enter = span.enter();

        let started_at = self.clock.now();
        let verdict = if self.cancel.is_cancelled() {
            Err(FailureReason::CancelledBeforeStart)
        } else {
            self.update_remote()
        };
        self.finish(verdict, started_at);
    }

    /// Issue the call and wait on the gate until exactly one completion path settles it.
    fn update_remote(&self) -> Verdict {
        let Some(payload) = self.payload.as_ref() else {
            return Err(FailureReason::InvalidPayload);
        };
        if !self.connectivity.is_reachable() {
            return Err(FailureReason::Unreachable);
        }

        let (signal, waiter) = gate::gate();
        let race = Arc::new(Race::new(self.id, signal));

        let hook = if self.config.interrupt_on_cancel {
            // weak: a pending cancel hook must not keep the gate alive
            let weak = Arc::downgrade(&race);
            let Some(hook) = self.cancel.on_cancel(move || {
                if let Some(race) = weak.upgrade() {
                    race.settle("cancel", Err(FailureReason::Cancelled));
                }
            }) else {
                return Err(FailureReason::CancelledBeforeStart);
            };
            Some(hook)
        } else {
            None
        };

        let on_timeout = Arc::clone(&race);
        race.guard.arm(&*self.timer, self.config.timeout, move || {
            on_timeout.settle("timeout", Err(FailureReason::Timeout));
        });
        let timeout_ms = self.config.timeout.as_millis() as u64;
        tracing::debug!(timeout_ms, "timeout guard armed");

        let on_result = Arc::clone(&race);
        self.client.perform_call(
            payload,
            CallCompletion::new(move |result| {
                let path = if result.is_ok() { "success" } else { "error" };
                on_result.settle(path, result.map_err(FailureReason::from));
            }),
        );
        drop(race);

        let verdict = waiter.wait();
        if let Some(hook) = hook {
            self.cancel.clear_hook(hook);
        }
        verdict
    }

    fn finish(mut self, verdict: Verdict, started_at: chrono::DateTime<chrono::Utc>) {
        let finished_at = self.clock.now();
        let completion = Completion::settle(
            self.id,
            self.payload.take(),
            verdict,
            started_at,
            finished_at,
        );

        match &completion.reason {
            None => tracing::info!(status = ?completion.status, "task finished"),
            Some(reason) if matches!(reason, FailureReason::Timeout | FailureReason::Abandoned) => {
                tracing::warn!(status = ?completion.status, %reason, "task finished")
            }
            Some(reason) => tracing::info!(status = ?completion.status, %reason, "task finished"),
        }

        self.observer.on_complete(completion);
    }
}

/// Shared by the completion paths of one in-flight call.
struct Race {
    task_id: TaskId,
    settled: AtomicBool,
    guard: TimeoutGuard,
    signal: GateSignal,
}

impl Race {
    fn new(task_id: TaskId, signal: GateSignal) -> Self {
        Self {
            task_id,
            settled: AtomicBool::new(false),
            guard: TimeoutGuard::new(),
            signal,
        }
    }

    /// First caller wins: disarms the guard and opens the gate. Later callers are no-ops.
    fn settle(&self, path: &'static str, verdict: Verdict) -> bool {
        if self
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(task_id = %self.task_id, path, "completion lost the race");
            return false;
        }

        let disarmed = self.guard.disarm();
        tracing::debug!(task_id = %self.task_id, path, disarmed, "completion won the race");
        self.signal.open(verdict)
    }
}
