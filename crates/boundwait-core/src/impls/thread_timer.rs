//! ThreadTimer - スレッド 1 本で 1 つのデッドラインを待つタイマー
//!
//! # 実装詳細
//! - Mutex<bool>（キャンセル済みか）+ Condvar
//! - `wait_timeout_while` でデッドラインまで待ち、キャンセルされたら即座に起きて終了
//! - スレッド生成に失敗したらアクションを drop する（待ち手は Abandoned で起きる）

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::ports::{Timer, TimerAction, TimerEntry};

type Shared = Arc<(Mutex<bool>, Condvar)>;

#[derive(Debug, Clone, Default)]
pub struct ThreadTimer {
    _private: (),
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

struct ThreadTimerEntry {
    shared: Shared,
}

impl TimerEntry for ThreadTimerEntry {
    fn cancel(self: Box<Self>) {
        let (cancelled, condvar) = &*self.shared;
        *cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_one();
    }
}

impl Timer for ThreadTimer {
    fn schedule(&self, after: Duration, action: TimerAction) -> Box<dyn TimerEntry> {
        let shared: Shared = Arc::new((Mutex::new(false), Condvar::new()));
        let waiter = Arc::clone(&shared);

        let spawned = thread::Builder::new()
            .name("boundwait-timer".to_string())
            .spawn(move || {
                let (cancelled, condvar) = &*waiter;
                let guard = cancelled.lock().unwrap_or_else(PoisonError::into_inner);
                let (guard, _) = condvar
                    .wait_timeout_while(guard, after, |cancelled| !*cancelled)
                    .unwrap_or_else(PoisonError::into_inner);
                let fire = !*guard;
                drop(guard);
                if fire {
                    action();
                }
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "failed to spawn timer thread; timeout dropped");
        }

        Box::new(ThreadTimerEntry { shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn fires_after_delay() {
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        let _entry = ThreadTimer::new().schedule(
            Duration::from_millis(50),
            Box::new(move || tx.send(Instant::now()).unwrap()),
        );

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at - start >= Duration::from_millis(50));
    }

    #[test]
    fn cancelled_entry_does_not_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        let entry = ThreadTimer::new().schedule(
            Duration::from_millis(50),
            Box::new(move || f.store(true, Ordering::SeqCst)),
        );
        entry.cancel();

        thread::sleep(Duration::from_millis(150));
        assert!(!fired.load(Ordering::SeqCst));
    }
}
