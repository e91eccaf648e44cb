//! Completion record handed to the result observer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::FailureReason;
use super::ids::TaskId;
use super::status::Status;

/// The payload returned to the caller with its final status attached.
///
/// `status` is never `Pending`: a `Completion` is only built from a settled verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion<P> {
    pub task_id: TaskId,

    /// `None` only when the task was built without a payload.
    pub payload: Option<P>,

    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<P> Completion<P> {
    pub(crate) fn settle(
        task_id: TaskId,
        payload: Option<P>,
        verdict: Result<(), FailureReason>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let (status, reason) = match verdict {
            Ok(()) => (Status::Success, None),
            Err(reason) => (Status::Failure, Some(reason)),
        };

        Self {
            task_id,
            payload,
            status,
            reason,
            started_at,
            finished_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
