//! Typed producer for `OrderPaid` events.

use events::OrderPaidEvent;
use transport::{Producer, TransportError};

/// Publishes [`OrderPaidEvent`]s keyed by order id, so every event for one
/// order lands on the same partition.
pub struct OrderPaidPublisher<P> {
    producer: P,
}

impl<P: Producer> OrderPaidPublisher<P> {
    pub fn new(producer: P) -> Self {
        Self { producer }
    }

    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id, topic = self.producer.topic()))]
    pub async fn publish(&self, event: &OrderPaidEvent) -> Result<(), TransportError> {
        let key = event.order_id.to_string();
        self.producer.send(key.as_bytes(), &event.encode()).await?;
        tracing::info!(event_id = %event.event_id, "order paid event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{EventId, OrderId, TransactionId, UserId};
    use transport::InMemoryBroker;

    #[tokio::test]
    async fn test_publish_keys_by_order_id() {
        let broker = InMemoryBroker::new();
        let publisher = OrderPaidPublisher::new(broker.producer(events::ORDER_PAID_TOPIC));
        let event = OrderPaidEvent {
            event_id: EventId::new(),
            order_id: OrderId::new(),
            user_id: UserId::new(),
            payment_method: "CARD".to_string(),
            transaction_id: TransactionId::new(),
        };

        publisher.publish(&event).await.unwrap();

        let records = broker.records(events::ORDER_PAID_TOPIC).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, event.order_id.to_string().into_bytes());
        assert_eq!(OrderPaidEvent::decode(&records[0].value).unwrap(), event);
    }
}
