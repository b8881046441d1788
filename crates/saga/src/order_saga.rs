//! Order saga: creation, payment, cancellation and lookup.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use common::{EventId, Money, OrderId, PartId, TransactionId, UserId};
use domain::{
    Order, OrderRepository, OrderStatus, PaymentMethod, RepositoryError, TransitionError,
};
use events::OrderPaidEvent;
use transport::Producer;

use crate::error::{OrderError, Result};
use crate::publisher::OrderPaidPublisher;
use crate::services::{ClientError, InventoryClient, PartsFilter, PaymentClient};

/// Default bound on each collaborator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct SagaConfig {
    /// Per-call timeout for Inventory and Payment, independent of the caller's deadline.
    pub call_timeout: Duration,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Drives an order from creation through payment.
///
/// Assembly completion arrives asynchronously and is applied by
/// [`crate::OrderAssembledHandler`].
pub struct OrderSaga<R, I, P, Pr> {
    repository: R,
    inventory: I,
    payment: P,
    publisher: OrderPaidPublisher<Pr>,
    config: SagaConfig,
    /// Orders with a payment in progress in this process.
    paying: Mutex<HashSet<OrderId>>,
}

/// Releases an order's payment claim when dropped.
struct PaymentClaim<'a> {
    paying: &'a Mutex<HashSet<OrderId>>,
    order_id: OrderId,
}

impl Drop for PaymentClaim<'_> {
    fn drop(&mut self) {
        self.paying
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.order_id);
    }
}

impl<R, I, P, Pr> OrderSaga<R, I, P, Pr>
where
    R: OrderRepository,
    I: InventoryClient,
    P: PaymentClient,
    Pr: Producer,
{
    pub fn new(repository: R, inventory: I, payment: P, producer: Pr) -> Self {
        Self::with_config(repository, inventory, payment, producer, SagaConfig::default())
    }

    pub fn with_config(
        repository: R,
        inventory: I,
        payment: P,
        producer: Pr,
        config: SagaConfig,
    ) -> Self {
        Self {
            repository,
            inventory,
            payment,
            publisher: OrderPaidPublisher::new(producer),
            config,
            paying: Mutex::new(HashSet::new()),
        }
    }

    /// Creates an order for `part_ids`, priced from the catalog.
    ///
    /// A part id listed twice is charged twice. Nothing is persisted if any
    /// part is missing from the catalog.
    #[tracing::instrument(skip(self, part_ids), fields(parts = part_ids.len()))]
    pub async fn create(&self, user_id: UserId, part_ids: Vec<PartId>) -> Result<(OrderId, Money)> {
        if part_ids.is_empty() {
            return Err(OrderError::EmptyParts);
        }

        let filter = PartsFilter {
            ids: part_ids.clone(),
        };
        let parts = self
            .bounded("inventory", self.inventory.list_parts(filter))
            .await?;
        let prices: HashMap<PartId, Money> = parts.into_iter().map(|p| (p.id, p.price)).collect();

        let mut total_price = Money::zero();
        for id in &part_ids {
            let price = prices.get(id).ok_or(OrderError::PartNotFound(*id))?;
            total_price += *price;
        }

        let order = Order::new(user_id, part_ids, total_price);
        self.repository.create(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), %total_price, "order created");
        Ok((order.id(), total_price))
    }

    /// Pays a pending order.
    ///
    /// The `OrderPaid` event is published before the order row is updated.
    /// The two steps are not atomic: if the update fails the event is already
    /// out and the order stays `PENDING_PAYMENT`. If the assembled event lands
    /// in between, the payment is recorded on the `ASSEMBLED` row instead.
    ///
    /// A second `pay` for the same order while one is in flight in this
    /// process fails with `PaymentInProgress` before Payment is called.
    #[tracing::instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn pay(&self, order_id: OrderId, payment_method: PaymentMethod) -> Result<TransactionId> {
        if !payment_method.is_known() {
            return Err(OrderError::PaymentMethodRequired);
        }
        let _claim = self.claim_payment(order_id)?;

        let mut order = self.repository.get(order_id).await?;
        let observed = order.status();
        if !observed.can_pay() {
            return Err(OrderError::CannotPay {
                order_id,
                status: observed,
            });
        }

        let transaction_id = self
            .bounded(
                "payment",
                self.payment
                    .pay_order(order_id, order.user_id(), payment_method),
            )
            .await?;

        let event = OrderPaidEvent {
            event_id: EventId::new(),
            order_id,
            user_id: order.user_id(),
            payment_method: payment_method.as_str().to_string(),
            transaction_id,
        };
        self.publisher.publish(&event).await?;

        order
            .pay(transaction_id, payment_method)
            .map_err(|e| transition_error(order_id, e))?;
        match self.repository.update(&order, observed).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict {
                actual: OrderStatus::Assembled,
                ..
            }) => {
                self.record_late_payment(order_id, transaction_id, payment_method)
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }

        metrics::counter!("orders_paid_total", "method" => payment_method.as_str()).increment(1);
        tracing::info!(%transaction_id, "order paid");
        Ok(transaction_id)
    }

    /// Cancels an order that has not been paid.
    #[tracing::instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<()> {
        let mut order = self.repository.get(order_id).await?;
        let observed = order.status();

        order.cancel().map_err(|e| transition_error(order_id, e))?;
        self.repository.update(&order, observed).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!("order cancelled");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        Ok(self.repository.get(order_id).await?)
    }

    fn claim_payment(&self, order_id: OrderId) -> Result<PaymentClaim<'_>> {
        let mut paying = self.paying.lock().unwrap_or_else(PoisonError::into_inner);
        if !paying.insert(order_id) {
            return Err(OrderError::PaymentInProgress(order_id));
        }
        Ok(PaymentClaim {
            paying: &self.paying,
            order_id,
        })
    }

    /// Writes payment data onto an order that was assembled while its
    /// payment was being persisted.
    async fn record_late_payment(
        &self,
        order_id: OrderId,
        transaction_id: TransactionId,
        payment_method: PaymentMethod,
    ) -> Result<()> {
        let mut stored = self.repository.get(order_id).await?;
        let observed = stored.status();
        stored
            .attach_late_payment(transaction_id, payment_method)
            .map_err(|e| transition_error(order_id, e))?;
        self.repository.update(&stored, observed).await?;

        tracing::warn!(%transaction_id, "order assembled before its payment was stored");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        service: &'static str,
        call: impl Future<Output = std::result::Result<T, ClientError>>,
    ) -> Result<T> {
        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ClientError::Cancelled)) => Err(OrderError::Cancelled { service }),
            Ok(Err(source)) => Err(OrderError::Collaborator { service, source }),
            Err(_) => {
                tracing::warn!(service, ?timeout, "collaborator call timed out");
                Err(OrderError::Timeout { service, timeout })
            }
        }
    }
}

fn transition_error(order_id: OrderId, e: TransitionError) -> OrderError {
    match e {
        TransitionError::CannotPay { status } => OrderError::CannotPay { order_id, status },
        TransitionError::AlreadyPaid => OrderError::AlreadyPaid(order_id),
        TransitionError::AlreadyCancelled => OrderError::AlreadyCancelled(order_id),
    }
}
