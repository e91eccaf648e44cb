//! Ports - 外部協調者の抽象化
//!
//! BoundedTask が依存する外部システム（リモート API クライアント、到達性チェック、
//! タイマー、時計、結果の受け手）をここで trait として定義します。
//! 実装は `impls` か、利用側のクレートに置きます。

pub mod clock;
pub mod connectivity;
pub mod id_generator;
pub mod observer;
pub mod remote_client;
pub mod timer;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::connectivity::Connectivity;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::observer::{ChannelObserver, ResultObserver};
pub use self::remote_client::{AsyncRemoteClient, CallCompletion, RemoteClient};
pub use self::timer::{Timer, TimerAction, TimerEntry};
