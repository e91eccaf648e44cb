use serde::{Deserialize, Serialize};

/// Snapshot of a work queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: usize,
    pub running: usize,
    pub finished: usize,
}

impl QueueCounts {
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && self.running == 0
    }
}
