//! Consumer group runner.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::handler::SharedHandler;
use crate::message::Message;
use crate::middleware::{Middleware, SharedMiddleware, compose};

/// Per-partition queue depth between the fetch loop and a partition worker.
const PARTITION_BUFFER: usize = 64;

/// A subscription that yields records for one consumer group.
///
/// `next` must be cancel-safe: dropping its future must not lose a record.
#[async_trait]
pub trait RecordSource: Send + Sync + 'static {
    /// Waits for the next record. `Ok(None)` means the subscription is closed.
    async fn next(&self) -> Result<Option<Message>>;

    /// Marks `msg` as processed so its offset is committed for the group.
    async fn ack(&self, msg: &Message) -> Result<()>;
}

/// Binds one consumer group identity to a record source and dispatches
/// records to a handler wrapped in middleware.
pub struct ConsumerGroup<S: RecordSource> {
    group_id: String,
    source: Arc<S>,
    middlewares: Vec<SharedMiddleware>,
}

impl<S: RecordSource> ConsumerGroup<S> {
    /// Creates a runner for `group_id` reading from `source`.
    pub fn new(group_id: impl Into<String>, source: S) -> Self {
        Self {
            group_id: group_id.into(),
            source: Arc::new(source),
            middlewares: Vec::new(),
        }
    }

    /// Appends a middleware. The first one added sees records first.
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Returns the consumer group identity.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Consumes records until `shutdown` is cancelled or the source fails fatally.
    ///
    /// Each `(topic, partition)` gets its own worker task, so one partition is
    /// handled sequentially while different partitions run concurrently.
    /// Workers finish the record they are handling before exiting. A handler
    /// that panics is treated like one that failed: the record is skipped
    /// and the partition keeps going.
    #[tracing::instrument(skip_all, fields(group = %self.group_id))]
    pub async fn consume(&self, shutdown: CancellationToken, handler: SharedHandler) -> Result<()> {
        let handler = compose(handler, &self.middlewares);
        let mut partitions: HashMap<(String, i32), mpsc::Sender<Message>> = HashMap::new();
        let mut workers = JoinSet::new();

        tracing::info!("consumer group started");

        let result = loop {
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => break Ok(()),
                next = self.source.next() => next,
            };

            let msg = match next {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    tracing::info!("record source closed");
                    break Ok(());
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "record source failed");
                    break Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transient record source error");
                    continue;
                }
            };

            let key = (msg.topic.clone(), msg.partition);
            let sender = partitions.entry(key.clone()).or_insert_with(|| {
                let (tx, rx) = mpsc::channel(PARTITION_BUFFER);
                workers.spawn(run_partition(
                    self.group_id.clone(),
                    Arc::clone(&self.source),
                    Arc::clone(&handler),
                    rx,
                    shutdown.clone(),
                ));
                tx
            });

            let sent = tokio::select! {
                biased;
                () = shutdown.cancelled() => break Ok(()),
                sent = sender.send(msg) => sent,
            };
            if let Err(mpsc::error::SendError(lost)) = sent {
                // The record stays unacknowledged; the next one for this
                // partition gets a fresh worker.
                tracing::error!(
                    topic = %lost.topic,
                    partition = lost.partition,
                    offset = lost.offset,
                    "partition worker stopped unexpectedly"
                );
                partitions.remove(&key);
            }
        };

        drop(partitions);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "partition worker panicked");
            }
        }

        tracing::info!("consumer group stopped");
        result
    }
}

async fn run_partition<S: RecordSource>(
    group_id: String,
    source: Arc<S>,
    handler: SharedHandler,
    mut records: mpsc::Receiver<Message>,
    shutdown: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            msg = records.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let outcome = AssertUnwindSafe(handler.handle(&msg, &shutdown))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                if let Err(e) = source.ack(&msg).await {
                    tracing::warn!(error = %e, "failed to acknowledge record");
                }
            }
            Ok(Err(e)) => {
                // Not acknowledged: redelivered only after a rebalance or restart.
                tracing::warn!(
                    group = %group_id,
                    topic = %msg.topic,
                    partition = msg.partition,
                    offset = msg.offset,
                    error = %e,
                    "handler failed, skipping record"
                );
                record_skipped(&group_id);
            }
            Err(_) => {
                tracing::error!(
                    group = %group_id,
                    topic = %msg.topic,
                    partition = msg.partition,
                    offset = msg.offset,
                    "handler panicked, skipping record"
                );
                record_skipped(&group_id);
            }
        }
    }
}

/// Counts records the runner left unacknowledged, per group. Unlike
/// `MetricsMiddleware`'s per-topic failure counter this is always recorded
/// and includes panicking handlers.
fn record_skipped(group_id: &str) {
    metrics::counter!("transport_records_skipped_total", "group" => group_id.to_string())
        .increment(1);
}
