//! Broker-agnostic message transport.
//!
//! Business code only sees [`Message`], [`MessageHandler`] and [`Producer`].
//! A [`ConsumerGroup`] drives any [`RecordSource`] (Kafka or the in-memory
//! broker) and dispatches each record through a middleware chain:
//!
//! - records from one partition are handled sequentially, in broker order
//! - a record is acknowledged only after its handler succeeds
//! - a failed record is logged and skipped, never retried in place

pub mod consumer;
pub mod error;
pub mod handler;
pub mod kafka;
pub mod memory;
pub mod message;
pub mod middleware;
pub mod producer;
pub mod supervisor;

pub use consumer::{ConsumerGroup, RecordSource};
pub use error::{Result, TransportError};
pub use handler::{FnHandler, HandlerError, MessageHandler, SharedHandler, handler_fn};
pub use kafka::{KafkaConsumerSource, KafkaProducer};
pub use memory::{InMemoryBroker, InMemoryProducer, InMemorySource};
pub use message::Message;
pub use middleware::{LoggingMiddleware, MetricsMiddleware, Middleware, SharedMiddleware, compose};
pub use producer::Producer;
pub use supervisor::{Supervisor, SupervisorError, shutdown_signal};

pub use tokio_util::sync::CancellationToken;
