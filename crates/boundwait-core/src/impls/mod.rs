//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **ThreadTimer**: 専用スレッド + Condvar のタイマー（ランタイム不要、デフォルト）
//! - **TokioTimer**: tokio ランタイム上のタイマー
//! - **SpawnedClient**: async クライアントをコールバック型 RemoteClient に橋渡し
//! - **AlwaysReachable / ReachabilityFlag**: Connectivity

pub mod reachability;
pub mod spawned_client;
pub mod thread_timer;
pub mod tokio_timer;

pub use self::reachability::{AlwaysReachable, ReachabilityFlag};
pub use self::spawned_client::SpawnedClient;
pub use self::thread_timer::ThreadTimer;
pub use self::tokio_timer::TokioTimer;
