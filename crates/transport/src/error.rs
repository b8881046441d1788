//! Transport error types.

use thiserror::Error;

/// Errors raised by record sources, producers and the consumer group runner.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The broker client reported an error while receiving records.
    ///
    /// `fatal` errors end [`crate::ConsumerGroup::consume`]; all others are
    /// logged and consumption continues.
    #[error("Broker error: {message}")]
    Broker { message: String, fatal: bool },

    /// Publishing a record was not confirmed by the broker.
    #[error("Failed to publish to topic {topic}: {message}")]
    Publish { topic: String, message: String },

    /// Storing the consumed offset failed.
    #[error("Failed to acknowledge {topic}[{partition}]@{offset}: {message}")]
    Ack {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },

    /// The broker client could not be configured or created.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// Returns true if consumption cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::Broker { fatal, .. } => *fatal,
            TransportError::Config(_) => true,
            TransportError::Publish { .. } | TransportError::Ack { .. } => false,
        }
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
