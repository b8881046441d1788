//! Turns paid orders into assembled orders.

use std::time::Duration;

use async_trait::async_trait;
use common::EventId;
use events::{OrderAssembledEvent, OrderPaidEvent};
use transport::{CancellationToken, HandlerError, Message, MessageHandler, Producer};

use crate::error::{AssemblyError, Result};
use crate::publisher::OrderAssembledPublisher;

/// Consumes `OrderPaid`, waits out the build time and emits `OrderAssembled`.
pub struct AssemblyHandler<P> {
    publisher: OrderAssembledPublisher<P>,
    build_time: Duration,
}

impl<P: Producer> AssemblyHandler<P> {
    pub fn new(producer: P, build_time: Duration) -> Self {
        Self {
            publisher: OrderAssembledPublisher::new(producer),
            build_time,
        }
    }

    /// Builds the order and publishes the assembled event.
    ///
    /// Returns `Interrupted` without publishing if `shutdown` fires first.
    #[tracing::instrument(skip_all, fields(order_id = %paid.order_id))]
    pub async fn assemble(
        &self,
        paid: &OrderPaidEvent,
        shutdown: &CancellationToken,
    ) -> Result<OrderAssembledEvent> {
        tracing::info!(build_time = ?self.build_time, "assembly started");

        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::warn!("assembly interrupted");
                return Err(AssemblyError::Interrupted(paid.order_id));
            }
            () = tokio::time::sleep(self.build_time) => {}
        }

        let event = OrderAssembledEvent {
            event_id: EventId::new(),
            order_id: paid.order_id,
            user_id: paid.user_id,
            build_time_sec: i64::try_from(self.build_time.as_secs()).unwrap_or(i64::MAX),
        };
        self.publisher.publish(&event).await?;

        metrics::counter!("assembly_builds_total").increment(1);
        metrics::histogram!("assembly_build_duration_seconds").record(self.build_time.as_secs_f64());
        Ok(event)
    }
}

#[async_trait]
impl<P: Producer> MessageHandler for AssemblyHandler<P> {
    async fn handle(
        &self,
        msg: &Message,
        shutdown: &CancellationToken,
    ) -> std::result::Result<(), HandlerError> {
        let paid = OrderPaidEvent::decode(&msg.value).map_err(AssemblyError::from)?;
        self.assemble(&paid, shutdown).await?;
        Ok(())
    }
}
