//! RemoteClient port - コールバック完了型のリモート呼び出し
//!
//! BoundedTask は `perform_call` を高々 1 回呼ぶ。クライアントは渡された
//! `CallCompletion` をちょうど 1 回 `complete` する契約（消費型なので 2 回目は型で防がれる）。
//! completion を drop した場合はタイマーかキャンセルが決着をつける。

use async_trait::async_trait;

use crate::domain::RemoteError;

type Settle = Box<dyn FnOnce(Result<(), RemoteError>) + Send + 'static>;

/// Single-use completion callback handed to a [`RemoteClient`].
pub struct CallCompletion {
    settle: Settle,
}

impl CallCompletion {
    pub(crate) fn new(settle: impl FnOnce(Result<(), RemoteError>) + Send + 'static) -> Self {
        Self {
            settle: Box::new(settle),
        }
    }

    /// Report the outcome of the remote call.
    pub fn complete(self, result: Result<(), RemoteError>) {
        (self.settle)(result)
    }

    pub fn succeed(self) {
        self.complete(Ok(()))
    }

    pub fn fail(self, error: RemoteError) {
        self.complete(Err(error))
    }
}

impl std::fmt::Debug for CallCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallCompletion").finish_non_exhaustive()
    }
}

/// Push-style client: starts the call and returns immediately.
pub trait RemoteClient<P>: Send + Sync {
    fn perform_call(&self, payload: &P, completion: CallCompletion);
}

/// Async client; bridge it into [`RemoteClient`] with `impls::SpawnedClient`.
#[async_trait]
pub trait AsyncRemoteClient<P>: Send + Sync {
    async fn call(&self, payload: P) -> Result<(), RemoteError>;
}
