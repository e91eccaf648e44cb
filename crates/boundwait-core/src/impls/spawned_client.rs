//! SpawnedClient - AsyncRemoteClient をコールバック型 RemoteClient に変換する
//!
//! `perform_call` は payload を clone して tokio ランタイムに spawn し、すぐ戻る。
//! future の結果がそのまま completion に渡る。ランタイム停止で future が捨てられた場合、
//! completion は呼ばれずに drop される（タイムアウトが決着をつける）。

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::ports::{AsyncRemoteClient, CallCompletion, RemoteClient};

pub struct SpawnedClient<C> {
    inner: Arc<C>,
    handle: Handle,
}

impl<C> SpawnedClient<C> {
    pub fn new(inner: Arc<C>, handle: Handle) -> Self {
        Self { inner, handle }
    }
}

impl<P, C> RemoteClient<P> for SpawnedClient<C>
where
    P: Clone + Send + 'static,
    C: AsyncRemoteClient<P> + 'static,
{
    fn perform_call(&self, payload: &P, completion: CallCompletion) {
        let inner = Arc::clone(&self.inner);
        let payload = payload.clone();
        self.handle.spawn(async move {
            let result = inner.call(payload).await;
            completion.complete(result);
        });
    }
}
