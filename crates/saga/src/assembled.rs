//! Applies `OrderAssembled` events to orders.

use async_trait::async_trait;
use domain::{OrderRepository, OrderStatus};
use events::OrderAssembledEvent;
use transport::{CancellationToken, HandlerError, Message, MessageHandler};

use crate::error::Result;

/// Marks orders `ASSEMBLED` when the assembly service reports completion.
///
/// The status is overwritten whatever it was before, so redelivered or
/// out-of-order events never fail; a prior status other than `PAID` is
/// logged as a warning.
pub struct OrderAssembledHandler<R> {
    repository: R,
}

impl<R: OrderRepository> OrderAssembledHandler<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id, event_id = %event.event_id))]
    pub async fn apply(&self, event: &OrderAssembledEvent) -> Result<()> {
        let mut order = self.repository.get(event.order_id).await?;
        let previous = order.mark_assembled();

        if previous != OrderStatus::Paid {
            tracing::warn!(
                previous_status = %previous,
                "order assembled from unexpected status"
            );
        }

        self.repository.update(&order, previous).await?;

        metrics::counter!("orders_assembled_total").increment(1);
        tracing::info!(build_time_sec = event.build_time_sec, "order assembled");
        Ok(())
    }
}

#[async_trait]
impl<R: OrderRepository> MessageHandler for OrderAssembledHandler<R> {
    async fn handle(
        &self,
        msg: &Message,
        _shutdown: &CancellationToken,
    ) -> std::result::Result<(), HandlerError> {
        let event = OrderAssembledEvent::decode(&msg.value)?;
        self.apply(&event).await?;
        Ok(())
    }
}
