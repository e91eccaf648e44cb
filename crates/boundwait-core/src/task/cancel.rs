//! Cancellation token.
//!
//! `cancel()` は冪等。待機中のタスクは interrupt フックを登録しておき、
//! キャンセルがレースの 4 番目の参加者として決着をつけられるようにする。
//! フックは登録 ID ごとに保持するので、トークンを共有する複数タスクがそれぞれ割り込まれる。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Hook = Box<dyn FnOnce() + Send + 'static>;

/// Handle for one registered interrupt hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HookId(u64);

#[derive(Default)]
struct Hooks {
    next_id: u64,
    pending: Vec<(HookId, Hook)>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    hooks: Mutex<Hooks>,
}

/// Shared cancellation flag. Clones observe the same flag.
///
/// One token may be shared by several tasks; `cancel()` interrupts every one of them.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn hooks(&self) -> MutexGuard<'_, Hooks> {
        self.inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the flag and run every registered hook. Repeated calls have no further effect.
    pub fn cancel(&self) {
        let pending = {
            let mut hooks = self.hooks();
            if self.inner.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut hooks.pending)
        };
        // hooks run outside the lock: they may settle a race that clears its own hook
        for (_, hook) in pending {
            hook();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Register `hook` to run on the next `cancel()`.
    ///
    /// Returns `None` (and drops `hook`) if the token is already cancelled.
    pub(crate) fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) -> Option<HookId> {
        let mut hooks = self.hooks();
        if self.is_cancelled() {
            return None;
        }
        let id = HookId(hooks.next_id);
        hooks.next_id += 1;
        hooks.pending.push((id, Box::new(hook)));
        Some(id)
    }

    /// Remove the hook registered under `id`. Other registrations are untouched.
    pub(crate) fn clear_hook(&self, id: HookId) {
        self.hooks().pending.retain(|(registered, _)| *registered != id);
    }

    #[cfg(test)]
    fn hook_count(&self) -> usize {
        self.hooks().pending.len()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        assert!(
            token
                .on_cancel(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })
                .is_some()
        );

        token.cancel();
        token.cancel();
        token.clone().cancel();

        assert!(token.is_cancelled());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hook_rejected_after_cancel() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.on_cancel(|| panic!("must not run")).is_none());
    }

    #[test]
    fn cleared_hook_does_not_run() {
        let token = CancelToken::new();
        let id = token.on_cancel(|| panic!("must not run")).unwrap();
        token.clear_hook(id);
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn every_registered_hook_runs() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let h = Arc::clone(&hits);
            token
                .on_cancel(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        token.clone().cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(token.hook_count(), 0);
    }

    #[test]
    fn clearing_one_hook_keeps_the_others() {
        let token = CancelToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let first = token.on_cancel(|| panic!("cleared hook must not run")).unwrap();
        let h = Arc::clone(&hits);
        let second = token
            .on_cancel(move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_ne!(first, second);

        token.clear_hook(first);
        assert_eq!(token.hook_count(), 1);
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
