//! Timer port - 一回限りの遅延アクション
//!
//! TimeoutGuard がこれを使ってデッドラインを張る。`cancel` はベストエフォート:
//! 既に走り始めたアクションは止められない前提で、発火の排他は guard 側の状態機械が担う。

use std::time::Duration;

pub type TimerAction = Box<dyn FnOnce() + Send + 'static>;

/// Handle to one scheduled action.
pub trait TimerEntry: Send {
    /// Prevent the action from running if it has not started yet.
    fn cancel(self: Box<Self>);
}

pub trait Timer: Send + Sync {
    /// Run `action` once after `after` has elapsed.
    ///
    /// Implementations that drop `action` without running it (e.g. on shutdown)
    /// must drop it rather than leak it, so waiters observe abandonment.
    fn schedule(&self, after: Duration, action: TimerAction) -> Box<dyn TimerEntry>;
}
