//! Shared identifiers and value objects used by every order service.

mod ids;
mod money;

pub use ids::{EventId, OrderId, PartId, TransactionId, UserId};
pub use money::Money;
