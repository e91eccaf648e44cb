//! BoundedTaskBuilder - BoundedTask の組み立て
//!
//! # Fail-fast 設計
//! - observer と remote client は必須。無ければ `MissingCollaborator`
//! - timeout が 0 なら `ZeroTimeout`
//! - それ以外の協調者はデフォルト（常に到達可能、スレッドタイマー、システム時計）

use std::sync::Arc;
use std::time::Duration;

use super::{BoundedTask, CancelToken, TaskConfig};
use crate::domain::BoundWaitError;
use crate::impls::{AlwaysReachable, ThreadTimer};
use crate::ports::{
    Clock, Connectivity, IdGenerator, RemoteClient, ResultObserver, SystemClock, Timer,
    UlidGenerator,
};

pub(crate) fn default_ids() -> UlidGenerator<SystemClock> {
    UlidGenerator::new(SystemClock)
}

/// # 使用例
/// ```ignore
/// let task = BoundedTask::builder()
///     .payload(Record { id: 1 })
///     .observer(|c: Completion<Record>| println!("{:?}", c.status))
///     .client(client)
///     .timeout(Duration::from_millis(200))
///     .build()?;
/// ```
pub struct BoundedTaskBuilder<P> {
    payload: Option<P>,
    observer: Option<Box<dyn ResultObserver<P>>>,
    client: Option<Arc<dyn RemoteClient<P>>>,
    connectivity: Arc<dyn Connectivity>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: TaskConfig,
    cancel: CancelToken,
}

impl<P: Send + 'static> BoundedTaskBuilder<P> {
    pub fn new() -> Self {
        Self {
            payload: None,
            observer: None,
            client: None,
            connectivity: Arc::new(AlwaysReachable),
            timer: Arc::new(ThreadTimer::new()),
            clock: Arc::new(SystemClock),
            ids: Arc::new(default_ids()),
            config: TaskConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Payload to send. Leaving it unset (or `None`) makes the task fail with `InvalidPayload`.
    pub fn payload(mut self, payload: impl Into<Option<P>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn observer(mut self, observer: impl ResultObserver<P> + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn client(mut self, client: Arc<dyn RemoteClient<P>>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Share an existing cancellation token (e.g. one already held by the scheduler).
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn build(self) -> Result<BoundedTask<P>, BoundWaitError> {
        self.config.validate()?;
        let observer = self
            .observer
            .ok_or(BoundWaitError::MissingCollaborator("result observer"))?;
        let client = self
            .client
            .ok_or(BoundWaitError::MissingCollaborator("remote client"))?;

        Ok(BoundedTask {
            id: self.ids.generate_task_id(),
            payload: self.payload,
            config: self.config,
            cancel: self.cancel,
            observer,
            client,
            connectivity: self.connectivity,
            timer: self.timer,
            clock: self.clock,
        })
    }
}

impl<P: Send + 'static> Default for BoundedTaskBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
