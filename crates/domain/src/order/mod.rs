//! Order aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use state::{OrderStatus, UnknownStatus};
pub use value_objects::{Part, PaymentMethod, UnknownPaymentMethod};

use thiserror::Error;

/// A status transition the order does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Order cannot be paid in status {status}")]
    CannotPay { status: OrderStatus },

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Order is already paid")]
    AlreadyPaid,
}
