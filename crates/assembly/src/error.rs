//! Assembly error types.

use common::OrderId;
use events::CodecError;
use thiserror::Error;
use transport::TransportError;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Invalid order paid event: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to publish assembled event: {0}")]
    Publish(#[from] TransportError),

    /// Shutdown interrupted the build; the record stays unacknowledged.
    #[error("Assembly of order {0} interrupted by shutdown")]
    Interrupted(OrderId),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
