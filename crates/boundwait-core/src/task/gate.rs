//! Completion gate: one sender, one blocking receiver.
//!
//! `oneshot` の Sender は send で消費されるので、ゲートが 2 回開くことは型で防がれる。
//! Sender が誰にも send されずに drop された場合、待ち手は `Abandoned` で起きる。

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use crate::domain::FailureReason;

pub(crate) type Verdict = Result<(), FailureReason>;

pub(crate) fn gate() -> (GateSignal, GateWaiter) {
    let (tx, rx) = oneshot::channel();
    (
        GateSignal {
            tx: Mutex::new(Some(tx)),
        },
        GateWaiter { rx },
    )
}

/// Opening side, shared by every completion path.
pub(crate) struct GateSignal {
    tx: Mutex<Option<oneshot::Sender<Verdict>>>,
}

impl GateSignal {
    /// Open the gate. Returns false if it was already opened.
    pub(crate) fn open(&self, verdict: Verdict) -> bool {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match tx {
            Some(tx) => {
                // receiver gone means nobody waits anymore; still counts as opened
                let _ = tx.send(verdict);
                true
            }
            None => false,
        }
    }
}

/// Waiting side, owned by the thread running the task.
pub(crate) struct GateWaiter {
    rx: oneshot::Receiver<Verdict>,
}

impl GateWaiter {
    /// Block the current thread until the gate opens.
    ///
    /// # Panics
    /// When called from inside an async execution context (tokio forbids blocking there).
    pub(crate) fn wait(self) -> Verdict {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(FailureReason::Abandoned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn second_open_is_noop() {
        let (signal, waiter) = gate();
        assert!(signal.open(Ok(())));
        assert!(!signal.open(Err(FailureReason::Timeout)));
        assert_eq!(waiter.wait(), Ok(()));
    }

    #[test]
    fn waiter_unblocks_from_another_thread() {
        let (signal, waiter) = gate();
        let opener = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signal.open(Err(FailureReason::Timeout))
        });
        assert_eq!(waiter.wait(), Err(FailureReason::Timeout));
        assert!(opener.join().unwrap());
    }

    #[test]
    fn dropped_signal_abandons_waiter() {
        let (signal, waiter) = gate();
        drop(signal);
        assert_eq!(waiter.wait(), Err(FailureReason::Abandoned));
    }
}
