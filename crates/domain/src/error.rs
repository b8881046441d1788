//! Repository error types.

use common::OrderId;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors that can occur while reading or writing orders.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The stored status no longer matches the status the caller observed.
    #[error("Concurrent update of order {order_id}: expected status {expected}, found {actual}")]
    Conflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// A stored row could not be mapped back to an order.
    #[error("Invalid order row: {0}")]
    InvalidRow(String),

    /// The store refused the operation without a driver error.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
