//! Task status: Pending until exactly one terminal transition.

use serde::{Deserialize, Serialize};

use super::errors::BoundWaitError;

/// Status attached to a payload.
///
/// State transitions:
/// - Pending -> Success
/// - Pending -> Failure
///
/// Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Pending,
    Success,
    Failure,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure)
    }

    /// Move to `next`, rejecting anything other than Pending -> terminal.
    pub fn transition(&mut self, next: Status) -> Result<(), BoundWaitError> {
        if self.is_terminal() || !next.is_terminal() {
            return Err(BoundWaitError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}
