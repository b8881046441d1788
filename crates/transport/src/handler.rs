//! Message handler abstraction.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::message::Message;

/// Error returned by a handler. The runner only logs it.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Handles one delivered record.
///
/// `shutdown` is cancelled when the owning consumer group is stopping;
/// long-running handlers should stop waiting on it and return an error so
/// the record is not acknowledged.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, msg: &Message, shutdown: &CancellationToken)
    -> Result<(), HandlerError>;
}

/// A handler shared between partition workers.
pub type SharedHandler = Arc<dyn MessageHandler>;

#[async_trait]
impl<H: MessageHandler + ?Sized> MessageHandler for Arc<H> {
    async fn handle(
        &self,
        msg: &Message,
        shutdown: &CancellationToken,
    ) -> Result<(), HandlerError> {
        (**self).handle(msg, shutdown).await
    }
}

/// Adapts an async closure into a [`MessageHandler`].
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(
        &self,
        msg: &Message,
        _shutdown: &CancellationToken,
    ) -> Result<(), HandlerError> {
        (self.f)(msg.clone()).await
    }
}

/// Wraps an async closure as a shared handler.
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
