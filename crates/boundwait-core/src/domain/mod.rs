//! Domain model (IDs, status, failure taxonomy, completion record).

pub mod completion;
pub mod errors;
pub mod ids;
pub mod status;

pub use completion::Completion;
pub use errors::{BoundWaitError, FailureReason, RemoteError};
pub use ids::TaskId;
pub use status::Status;
