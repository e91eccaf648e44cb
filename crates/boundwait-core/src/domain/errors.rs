//! Errors - 失敗理由とクレートのエラー型
//!
//! - `FailureReason`: Status=Failure に添える診断用の理由コード（呼び出し側へは Completion 経由）
//! - `RemoteError`: RemoteClient が completion に渡すエラー
//! - `BoundWaitError`: 構築・設定・キュー操作の誤用

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::Status;

/// Error reported by a remote-call client through its completion.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("remote call failed: {message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why a task ended in `Status::Failure`.
///
/// All variants collapse to Failure for the caller; the variant is diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Cancel flag was already set when the scheduler invoked `run`.
    #[error("cancelled before start")]
    CancelledBeforeStart,

    /// Cancel arrived while waiting on the remote call.
    #[error("cancelled while waiting for the remote call")]
    Cancelled,

    /// No payload to send.
    #[error("invalid payload")]
    InvalidPayload,

    /// Connectivity check reported the remote as unreachable.
    #[error("remote unreachable")]
    Unreachable,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("timed out")]
    Timeout,

    /// Every holder of the completion gate went away without settling it.
    #[error("completion abandoned")]
    Abandoned,
}

impl FailureReason {
    /// True when no remote call was issued for this failure.
    pub fn is_pre_call(&self) -> bool {
        matches!(
            self,
            FailureReason::CancelledBeforeStart
                | FailureReason::InvalidPayload
                | FailureReason::Unreachable
        )
    }
}

#[derive(Debug, Error)]
pub enum BoundWaitError {
    #[error("invalid status transition {from:?} -> {to:?}")]
    InvalidTransition { from: Status, to: Status },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("queue width must be greater than zero")]
    ZeroWidth,

    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("work queue is shut down")]
    QueueClosed,

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
