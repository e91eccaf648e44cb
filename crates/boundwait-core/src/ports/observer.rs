//! ResultObserver port - 結果の受け手
//!
//! 保存されたクロージャが外部の可変状態を暗黙にキャプチャする形を避けるため、
//! 受け手は所有権ごと BoundedTask に渡し、呼び出し時に消費する（FnOnce 相当）。
//! チャネルで受け取りたい場合は `ChannelObserver` を使う。

use tokio::sync::mpsc;

use crate::domain::Completion;

/// Receives the final completion of one task. Consumed on delivery, so it runs at most once.
pub trait ResultObserver<P>: Send {
    fn on_complete(self: Box<Self>, completion: Completion<P>);
}

impl<P, F> ResultObserver<P> for F
where
    F: FnOnce(Completion<P>) + Send,
{
    fn on_complete(self: Box<Self>, completion: Completion<P>) {
        (*self)(completion)
    }
}

/// Forwards completions into an unbounded channel.
///
/// Several tasks may share one receiver by cloning the observer.
#[derive(Debug)]
pub struct ChannelObserver<P> {
    tx: mpsc::UnboundedSender<Completion<P>>,
}

impl<P> Clone for ChannelObserver<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P> ChannelObserver<P> {
    pub fn new(tx: mpsc::UnboundedSender<Completion<P>>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Completion<P>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl<P: Send> ResultObserver<P> for ChannelObserver<P> {
    fn on_complete(self: Box<Self>, completion: Completion<P>) {
        if self.tx.send(completion).is_err() {
            tracing::debug!("completion receiver dropped; result discarded");
        }
    }
}
