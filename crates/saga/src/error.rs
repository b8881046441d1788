//! Saga error types.

use std::time::Duration;

use common::{OrderId, PartId};
use domain::{OrderStatus, RepositoryError};
use events::CodecError;
use thiserror::Error;
use transport::TransportError;

use crate::services::ClientError;

/// Coarse classification of an [`OrderError`], used by callers to pick a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Timeout,
    Cancelled,
    Internal,
}

/// Errors that can occur during order saga operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order must contain at least one part")]
    EmptyParts,

    #[error("Payment method must be specified")]
    PaymentMethodRequired,

    /// A requested part is missing from the catalog.
    #[error("Part with uuid {0} not found")]
    PartNotFound(PartId),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Order {order_id} cannot be paid in status {status}")]
    CannotPay { order_id: OrderId, status: OrderStatus },

    #[error("Order {0} is already paid")]
    AlreadyPaid(OrderId),

    #[error("Order {0} is already cancelled")]
    AlreadyCancelled(OrderId),

    #[error("Order {0} already has a payment in progress")]
    PaymentInProgress(OrderId),

    /// Another writer changed the order between read and write.
    #[error("Order {order_id} was concurrently changed to {actual}")]
    ConcurrentUpdate { order_id: OrderId, actual: OrderStatus },

    #[error("{service} service did not answer within {timeout:?}")]
    Timeout {
        service: &'static str,
        timeout: Duration,
    },

    #[error("{service} service call was cancelled")]
    Cancelled { service: &'static str },

    #[error("{service} service error: {source}")]
    Collaborator {
        service: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Publish error: {0}")]
    Publish(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyParts | Self::PaymentMethodRequired | Self::PartNotFound(_) => {
                ErrorKind::Validation
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::CannotPay { .. }
            | Self::AlreadyPaid(_)
            | Self::AlreadyCancelled(_)
            | Self::PaymentInProgress(_)
            | Self::ConcurrentUpdate { .. } => ErrorKind::Conflict,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Collaborator { .. } | Self::Repository(_) | Self::Publish(_) | Self::Codec(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<RepositoryError> for OrderError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Conflict {
                order_id, actual, ..
            } => Self::ConcurrentUpdate { order_id, actual },
            other => Self::Repository(other),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_faults_are_validation() {
        assert_eq!(OrderError::EmptyParts.kind(), ErrorKind::Validation);
        assert_eq!(OrderError::PaymentMethodRequired.kind(), ErrorKind::Validation);
        assert_eq!(
            OrderError::PartNotFound(PartId::new()).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_state_errors_are_conflicts() {
        let id = OrderId::new();
        assert_eq!(OrderError::AlreadyPaid(id).kind(), ErrorKind::Conflict);
        assert_eq!(OrderError::AlreadyCancelled(id).kind(), ErrorKind::Conflict);
        assert_eq!(
            OrderError::CannotPay {
                order_id: id,
                status: OrderStatus::Paid
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_repository_errors_are_translated() {
        let id = OrderId::new();

        let not_found: OrderError = RepositoryError::NotFound(id).into();
        assert!(matches!(not_found, OrderError::NotFound(missing) if missing == id));

        let conflict: OrderError = RepositoryError::Conflict {
            order_id: id,
            expected: OrderStatus::PendingPayment,
            actual: OrderStatus::Cancelled,
        }
        .into();
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let storage: OrderError = RepositoryError::Unavailable("down".to_string()).into();
        assert_eq!(storage.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_collaborator_failures() {
        let timeout = OrderError::Timeout {
            service: "payment",
            timeout: Duration::from_secs(3),
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);

        let cancelled = OrderError::Cancelled { service: "inventory" };
        assert_eq!(cancelled.kind(), ErrorKind::Cancelled);

        let failed = OrderError::Collaborator {
            service: "payment",
            source: ClientError::Rejected("declined".to_string()),
        };
        assert_eq!(failed.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_part_not_found_names_part() {
        let part = PartId::new();
        assert_eq!(
            OrderError::PartNotFound(part).to_string(),
            format!("Part with uuid {part} not found")
        );
    }
}
