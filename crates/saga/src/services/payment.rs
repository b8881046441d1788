//! Payment client trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, TransactionId, UserId};
use domain::PaymentMethod;

use super::ClientError;

/// Synchronous payment authorization.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Charges the user for the order and returns the transaction id.
    async fn pay_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<TransactionId, ClientError>;
}

#[async_trait]
impl<P: PaymentClient + ?Sized> PaymentClient for Arc<P> {
    async fn pay_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<TransactionId, ClientError> {
        (**self).pay_order(order_id, user_id, payment_method).await
    }
}

/// A payment accepted by [`InMemoryPaymentClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPayment {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub payment_method: PaymentMethod,
    pub transaction_id: TransactionId,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: Vec<RecordedPayment>,
    calls: usize,
    delay: Option<Duration>,
    fail_on_pay: bool,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentClient {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to decline every payment.
    pub fn set_fail_on_pay(&self, fail: bool) {
        self.write().fail_on_pay = fail;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.write().delay = delay;
    }

    /// Returns the number of payment attempts, successful or not.
    pub fn call_count(&self) -> usize {
        self.read().calls
    }

    /// Returns the accepted payments in call order.
    pub fn payments(&self) -> Vec<RecordedPayment> {
        self.read().payments.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryPaymentState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryPaymentState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentClient for InMemoryPaymentClient {
    async fn pay_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
        payment_method: PaymentMethod,
    ) -> Result<TransactionId, ClientError> {
        let delay = {
            let mut state = self.write();
            state.calls += 1;
            if state.fail_on_pay {
                return Err(ClientError::Rejected("payment declined".to_string()));
            }
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let transaction_id = TransactionId::new();
        self.write().payments.push(RecordedPayment {
            order_id,
            user_id,
            payment_method,
            transaction_id,
        });
        Ok(transaction_id)
    }
}
