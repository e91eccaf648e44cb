//! TokioTimer - tokio ランタイム上で `sleep` してからアクションを実行する
//!
//! アクションは async コンテキストで走るので、ブロックしない処理（ゲートを開くだけ）に限る。
//! ランタイムが落ちてタスクが捨てられると、アクションも drop される。

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::ports::{Timer, TimerAction, TimerEntry};

#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
}

impl TokioTimer {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Timer on the runtime of the calling thread, if there is one.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

struct TokioTimerEntry {
    abort: AbortHandle,
}

impl TimerEntry for TokioTimerEntry {
    fn cancel(self: Box<Self>) {
        self.abort.abort();
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, after: Duration, action: TimerAction) -> Box<dyn TimerEntry> {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            action();
        });
        Box::new(TokioTimerEntry {
            abort: task.abort_handle(),
        })
    }
}
