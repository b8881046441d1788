//! Typed producer for `OrderAssembled` events.

use events::OrderAssembledEvent;
use transport::{Producer, TransportError};

/// Publishes [`OrderAssembledEvent`]s keyed by order id.
pub struct OrderAssembledPublisher<P> {
    producer: P,
}

impl<P: Producer> OrderAssembledPublisher<P> {
    pub fn new(producer: P) -> Self {
        Self { producer }
    }

    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id, topic = self.producer.topic()))]
    pub async fn publish(&self, event: &OrderAssembledEvent) -> Result<(), TransportError> {
        let key = event.order_id.to_string();
        self.producer.send(key.as_bytes(), &event.encode()).await?;
        tracing::info!(event_id = %event.event_id, "order assembled event published");
        Ok(())
    }
}
