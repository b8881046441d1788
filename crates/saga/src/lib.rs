//! Order saga for the order service.
//!
//! The saga moves an order through its lifecycle:
//! 1. Create: price the requested parts through Inventory and persist the order
//! 2. Pay: charge through Payment, publish `OrderPaid`, persist `PAID`
//! 3. Assemble: apply the assembly service's `OrderAssembled` event
//!
//! Cancellation is allowed only before payment. The saga never retries and
//! has no compensating steps.

pub mod assembled;
pub mod error;
pub mod order_saga;
pub mod publisher;
pub mod services;

pub use assembled::OrderAssembledHandler;
pub use error::{ErrorKind, OrderError, Result};
pub use order_saga::{DEFAULT_CALL_TIMEOUT, OrderSaga, SagaConfig};
pub use publisher::OrderPaidPublisher;
pub use services::{
    ClientError, InMemoryInventoryClient, InMemoryPaymentClient, InventoryClient, PartsFilter,
    PaymentClient, RecordedPayment,
};
