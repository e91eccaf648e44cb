//! Connectivity implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ports::Connectivity;

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

impl Connectivity for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Shared reachability state, flipped by whatever monitors the network.
#[derive(Debug, Clone)]
pub struct ReachabilityFlag {
    reachable: Arc<AtomicBool>,
}

impl ReachabilityFlag {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }
}

impl Default for ReachabilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for ReachabilityFlag {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = ReachabilityFlag::default();
        let monitor = flag.clone();
        assert!(flag.is_reachable());

        monitor.set_reachable(false);
        assert!(!flag.is_reachable());
    }

    #[test]
    fn closures_are_connectivity() {
        let offline = || false;
        assert!(!offline.is_reachable());
        assert!(AlwaysReachable.is_reachable());
    }
}
