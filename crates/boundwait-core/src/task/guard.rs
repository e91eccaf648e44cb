//! Timeout guard.
//!
//! State machine:
//! - Idle -> Armed (arm)
//! - Armed -> Disarmed (disarm wins)
//! - Armed -> Fired (timer action wins)
//!
//! Both exits from Armed are a compare-and-swap, so a disarmed guard never runs
//! its action and a fired guard cannot be disarmed afterwards.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::ports::{Timer, TimerEntry};

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const DISARMED: u8 = 2;
const FIRED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GuardState {
    Idle,
    Armed,
    Disarmed,
    Fired,
}

pub(crate) struct TimeoutGuard {
    state: Arc<AtomicU8>,
    entry: Mutex<Option<Box<dyn TimerEntry>>>,
}

impl TimeoutGuard {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(IDLE)),
            entry: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> GuardState {
        match self.state.load(Ordering::Acquire) {
            IDLE => GuardState::Idle,
            ARMED => GuardState::Armed,
            DISARMED => GuardState::Disarmed,
            _ => GuardState::Fired,
        }
    }

    /// Schedule `on_fire` after `after`. A guard is armed at most once.
    pub(crate) fn arm(
        &self,
        timer: &dyn Timer,
        after: Duration,
        on_fire: impl FnOnce() + Send + 'static,
    ) -> bool {
        if self
            .state
            .compare_exchange(IDLE, ARMED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let state = Arc::clone(&self.state);
        let entry = timer.schedule(
            after,
            Box::new(move || {
                if state
                    .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    on_fire();
                }
            }),
        );

        // disarm may have run between schedule() and here; whoever holds the lock last cancels
        let mut slot = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if self.state() == GuardState::Armed {
            *slot = Some(entry);
        } else {
            drop(slot);
            entry.cancel();
        }
        true
    }

    /// Returns true if this call stopped an armed timer.
    pub(crate) fn disarm(&self) -> bool {
        let won = self
            .state
            .compare_exchange(ARMED, DISARMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            let entry = self
                .entry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(entry) = entry {
                entry.cancel();
            }
        }
        won
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualTimer;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fires_when_not_disarmed() {
        let timer = ManualTimer::new();
        let guard = TimeoutGuard::new();
        let (hits, on_fire) = counter();

        assert!(guard.arm(&timer, Duration::from_secs(5), on_fire));
        assert_eq!(guard.state(), GuardState::Armed);

        timer.fire_all();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(guard.state(), GuardState::Fired);
        assert!(!guard.disarm());
    }

    #[test]
    fn disarmed_guard_never_fires() {
        let timer = ManualTimer::new();
        let guard = TimeoutGuard::new();
        let (hits, on_fire) = counter();

        guard.arm(&timer, Duration::from_secs(5), on_fire);
        assert!(guard.disarm());
        assert_eq!(timer.cancelled(), 1);

        // action already handed to the timer still runs, but is a no-op
        timer.fire_all();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(guard.state(), GuardState::Disarmed);
    }

    #[test]
    fn arms_only_once() {
        let timer = ManualTimer::new();
        let guard = TimeoutGuard::new();
        let (_, first) = counter();
        let (_, second) = counter();

        assert!(guard.arm(&timer, Duration::from_secs(1), first));
        assert!(!guard.arm(&timer, Duration::from_secs(1), second));
        assert_eq!(timer.scheduled(), 1);
    }

    #[test]
    fn disarm_before_arm_is_noop() {
        let guard = TimeoutGuard::new();
        assert!(!guard.disarm());
        assert_eq!(guard.state(), GuardState::Idle);
    }
}
