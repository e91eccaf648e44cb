//! Connectivity port - 到達性チェック

/// Synchronous reachability query, consulted once per task before the call is issued.
pub trait Connectivity: Send + Sync {
    fn is_reachable(&self) -> bool;
}

impl<F> Connectivity for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_reachable(&self) -> bool {
        self()
    }
}
