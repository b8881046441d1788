//! In-memory order repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use super::OrderRepository;
use crate::error::{RepositoryError, Result};
use crate::order::{Order, OrderStatus};

/// Order repository backed by a map, for tests and single-process runs.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    fail_on_write: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to reject every create and update.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.fail_on_write.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_on_write.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "writes disabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get(&self, id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn create(&self, order: &Order) -> Result<()> {
        self.check_writable()?;

        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(RepositoryError::AlreadyExists(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        self.check_writable()?;

        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id())
            .ok_or(RepositoryError::NotFound(order.id()))?;

        if stored.status() != expected {
            return Err(RepositoryError::Conflict {
                order_id: order.id(),
                expected,
                actual: stored.status(),
            });
        }

        stored.transaction_id = order.transaction_id;
        stored.payment_method = order.payment_method;
        stored.status = order.status;
        stored.updated_at = order.updated_at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::PaymentMethod;
    use common::{Money, PartId, TransactionId, UserId};

    fn create_order() -> Order {
        Order::new(UserId::new(), vec![PartId::new()], Money::from_cents(100))
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let repo = InMemoryOrderRepository::new();
        let order = create_order();

        repo.create(&order).await.unwrap();

        assert_eq!(repo.get(order.id()).await.unwrap(), order);
        // Reads are idempotent.
        assert_eq!(repo.get(order.id()).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_get_missing_order() {
        let repo = InMemoryOrderRepository::new();
        let id = OrderId::new();

        let err = repo.get(id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let repo = InMemoryOrderRepository::new();
        let order = create_order();
        repo.create(&order).await.unwrap();

        let err = repo.create(&order).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_applies_when_status_matches() {
        let repo = InMemoryOrderRepository::new();
        let mut order = create_order();
        repo.create(&order).await.unwrap();

        order.pay(TransactionId::new(), PaymentMethod::Card).unwrap();
        repo.update(&order, OrderStatus::PendingPayment)
            .await
            .unwrap();

        assert_eq!(repo.get(order.id()).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_update_conflicts_on_stale_status() {
        let repo = InMemoryOrderRepository::new();
        let order = create_order();
        repo.create(&order).await.unwrap();

        let mut cancelled = order.clone();
        cancelled.cancel().unwrap();
        repo.update(&cancelled, OrderStatus::PendingPayment)
            .await
            .unwrap();

        let mut paid = order.clone();
        paid.pay(TransactionId::new(), PaymentMethod::Card).unwrap();
        let err = repo
            .update(&paid, OrderStatus::PendingPayment)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Conflict {
                actual: OrderStatus::Cancelled,
                ..
            }
        ));
        assert_eq!(
            repo.get(order.id()).await.unwrap().status(),
            OrderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_fail_on_write() {
        let repo = InMemoryOrderRepository::new();
        repo.set_fail_on_write(true);

        let err = repo.create(&create_order()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
        assert!(repo.is_empty().await);
    }
}
