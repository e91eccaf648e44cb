//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::domain::{Completion, RemoteError};
use crate::ports::{CallCompletion, RemoteClient, Timer, TimerAction, TimerEntry};

#[derive(Debug, Clone)]
enum Script {
    SucceedAfter(Duration),
    FailAfter(Duration, String),
    /// Keep the completion alive and never call it.
    Never,
    /// Drop the completion without calling it.
    Drop,
}

/// Remote client that follows a fixed script on a helper thread.
pub(crate) struct ScriptedClient {
    script: Script,
    calls: AtomicUsize,
    parked: Mutex<Vec<CallCompletion>>,
}

impl ScriptedClient {
    fn with(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            parked: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn succeed_after(d: Duration) -> Arc<Self> {
        Self::with(Script::SucceedAfter(d))
    }

    pub(crate) fn fail_after(d: Duration, message: &str) -> Arc<Self> {
        Self::with(Script::FailAfter(d, message.to_string()))
    }

    pub(crate) fn never() -> Arc<Self> {
        Self::with(Script::Never)
    }

    pub(crate) fn dropping() -> Arc<Self> {
        Self::with(Script::Drop)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Complete the oldest completion held by a `never()` client.
    pub(crate) fn complete_parked(&self, result: Result<(), RemoteError>) -> bool {
        let parked = {
            let mut parked = self.parked.lock().unwrap();
            if parked.is_empty() {
                None
            } else {
                Some(parked.remove(0))
            }
        };
        match parked {
            Some(completion) => {
                completion.complete(result);
                true
            }
            None => false,
        }
    }

    /// Spin until `perform_call` has been invoked `n` times.
    pub(crate) fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl<P> RemoteClient<P> for ScriptedClient {
    fn perform_call(&self, _payload: &P, completion: CallCompletion) {
        match self.script.clone() {
            Script::SucceedAfter(d) => {
                thread::spawn(move || {
                    thread::sleep(d);
                    completion.succeed();
                });
            }
            Script::FailAfter(d, message) => {
                thread::spawn(move || {
                    thread::sleep(d);
                    completion.fail(RemoteError::new(message));
                });
            }
            Script::Never => self.parked.lock().unwrap().push(completion),
            Script::Drop => drop(completion),
        }
        // counted last so a parked completion is visible once calls() moves
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Timer that only fires when told to.
#[derive(Default)]
pub(crate) struct ManualTimer {
    actions: Mutex<Vec<(Duration, TimerAction)>>,
    scheduled: AtomicUsize,
    cancelled: Arc<AtomicUsize>,
}

struct ManualEntry {
    cancelled: Arc<AtomicUsize>,
}

impl TimerEntry for ManualEntry {
    fn cancel(self: Box<Self>) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

impl ManualTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run every pending action, regardless of cancellation.
    pub(crate) fn fire_all(&self) {
        let actions: Vec<_> = self.actions.lock().unwrap().drain(..).collect();
        for (_, action) in actions {
            action();
        }
    }

    pub(crate) fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    pub(crate) fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn last_delay(&self) -> Option<Duration> {
        self.actions.lock().unwrap().last().map(|(d, _)| *d)
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, after: Duration, action: TimerAction) -> Box<dyn TimerEntry> {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.actions.lock().unwrap().push((after, action));
        Box::new(ManualEntry {
            cancelled: Arc::clone(&self.cancelled),
        })
    }
}

/// Timer that discards every action it is given.
pub(crate) struct DroppingTimer;

struct NoopEntry;

impl TimerEntry for NoopEntry {
    fn cancel(self: Box<Self>) {}
}

impl Timer for DroppingTimer {
    fn schedule(&self, _after: Duration, action: TimerAction) -> Box<dyn TimerEntry> {
        drop(action);
        Box::new(NoopEntry)
    }
}

pub(crate) type Recorded<P> = Arc<Mutex<Vec<Completion<P>>>>;

/// Observer that appends every completion it receives.
pub(crate) fn recorder<P: Send + 'static>()
-> (Recorded<P>, impl FnOnce(Completion<P>) + Send + 'static) {
    let seen: Recorded<P> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |c| sink.lock().unwrap().push(c))
}
