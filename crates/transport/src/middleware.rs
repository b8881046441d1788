//! Handler middleware.
//!
//! A middleware is a `Handler -> Handler` transform. [`compose`] applies a
//! list right-to-left, so for `[mw1, mw2]` the resulting handler is
//! `mw1(mw2(handler))`: `mw1` sees every record first.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::handler::{HandlerError, MessageHandler, SharedHandler};
use crate::message::Message;

/// Wraps a handler with additional behavior.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

/// A middleware shared by consumer groups.
pub type SharedMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(SharedHandler) -> SharedHandler + Send + Sync,
{
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        self(next)
    }
}

/// Composes `middlewares` around `handler` in declared order.
pub fn compose(handler: SharedHandler, middlewares: &[SharedMiddleware]) -> SharedHandler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}

/// Logs every received record before delegating.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    group_id: String,
}

impl LoggingMiddleware {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(Logged {
            group_id: self.group_id.clone(),
            next,
        })
    }
}

struct Logged {
    group_id: String,
    next: SharedHandler,
}

#[async_trait]
impl MessageHandler for Logged {
    async fn handle(
        &self,
        msg: &Message,
        shutdown: &CancellationToken,
    ) -> Result<(), HandlerError> {
        tracing::info!(
            group = %self.group_id,
            topic = %msg.topic,
            partition = msg.partition,
            offset = msg.offset,
            key = %msg.key_str(),
            "record received"
        );
        self.next.handle(msg, shutdown).await
    }
}

/// Records handled/failed counters and handling latency per topic.
///
/// `transport_records_failed_total` counts handler errors seen by this
/// layer. The runner's `transport_records_skipped_total` counts, per group,
/// every record left unacknowledged, including panics outside this layer.
#[derive(Debug, Clone, Default)]
pub struct MetricsMiddleware;

impl Middleware for MetricsMiddleware {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(Measured { next })
    }
}

struct Measured {
    next: SharedHandler,
}

#[async_trait]
impl MessageHandler for Measured {
    async fn handle(
        &self,
        msg: &Message,
        shutdown: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let start = Instant::now();
        let result = self.next.handle(msg, shutdown).await;

        metrics::histogram!("transport_handle_duration_seconds", "topic" => msg.topic.clone())
            .record(start.elapsed().as_secs_f64());
        match &result {
            Ok(()) => {
                metrics::counter!("transport_records_handled_total", "topic" => msg.topic.clone())
                    .increment(1)
            }
            Err(_) => {
                metrics::counter!("transport_records_failed_total", "topic" => msg.topic.clone())
                    .increment(1)
            }
        }
        result
    }
}
