//! Collaborator clients used by the order saga, with in-memory implementations.

pub mod inventory;
pub mod payment;

pub use inventory::{InMemoryInventoryClient, InventoryClient, PartsFilter};
pub use payment::{InMemoryPaymentClient, PaymentClient, RecordedPayment};

use thiserror::Error;

/// Failure reported by a collaborator service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The service could not be reached or failed internally.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The service cancelled the call.
    #[error("Call cancelled")]
    Cancelled,
}
