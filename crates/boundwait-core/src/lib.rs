//! boundwait-core
//!
//! Bounded-wait task adapter: one callback-completed remote call turned into a
//! blocking, timeout-bounded, cancellable unit of work.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, errors, completion）
//! - **ports**: 外部協調者の抽象化（RemoteClient, Connectivity, ResultObserver, Timer, Clock, IdGenerator）
//! - **task**: BoundedTask 本体（gate, guard, cancel, config）
//! - **impls**: ports の実装（ThreadTimer, TokioTimer, SpawnedClient, ReachabilityFlag など）
//! - **queue**: 逐次/並列で BoundedTask を走らせる WorkQueue

pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{BoundWaitError, Completion, FailureReason, RemoteError, Status, TaskId};
pub use queue::{QueueConfig, QueueCounts, UnitOfWork, WorkQueue};
pub use task::{BoundedTask, BoundedTaskBuilder, CancelToken, TaskConfig};
