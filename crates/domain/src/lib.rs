//! Domain layer for the order services.
//!
//! This crate provides:
//! - the `Order` aggregate with its status machine
//! - payment method and catalog part value objects
//! - the `OrderRepository` contract with in-memory and PostgreSQL backends

pub mod error;
pub mod order;
pub mod repository;

pub use error::{RepositoryError, Result};
pub use order::{
    Order, OrderStatus, Part, PaymentMethod, TransitionError, UnknownPaymentMethod, UnknownStatus,
};
pub use repository::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository};
