//! Order persistence contract and its backends.

mod memory;
mod postgres;

pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;

use crate::error::Result;
use crate::order::{Order, OrderStatus};

/// Storage for order rows.
///
/// The store is the single source of truth for order status. Concurrent
/// writers are serialised by [`OrderRepository::update`], which only applies
/// when the stored status still equals the status the caller read.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get(&self, id: OrderId) -> Result<Order>;

    /// Inserts a new order. Fails with `AlreadyExists` on a duplicate id.
    async fn create(&self, order: &Order) -> Result<()>;

    /// Replaces the mutable fields of an order.
    ///
    /// Fails with `NotFound` if the order does not exist and with `Conflict`
    /// if its stored status differs from `expected`.
    async fn update(&self, order: &Order, expected: OrderStatus) -> Result<()>;
}

#[async_trait]
impl<R: OrderRepository + ?Sized> OrderRepository for Arc<R> {
    async fn get(&self, id: OrderId) -> Result<Order> {
        (**self).get(id).await
    }

    async fn create(&self, order: &Order) -> Result<()> {
        (**self).create(order).await
    }

    async fn update(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        (**self).update(order, expected).await
    }
}
