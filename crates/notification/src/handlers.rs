//! Consumers that turn saga events into user notifications.

use async_trait::async_trait;
use chrono::Utc;
use events::{OrderAssembledEvent, OrderPaidEvent};
use transport::{CancellationToken, HandlerError, Message, MessageHandler};

use crate::error::NotifyError;
use crate::notifier::Notifier;
use crate::templates;

/// Notifies the user that an order was paid.
pub struct OrderPaidNotificationHandler<N> {
    notifier: N,
}

impl<N: Notifier> OrderPaidNotificationHandler<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<N: Notifier> MessageHandler for OrderPaidNotificationHandler<N> {
    async fn handle(&self, msg: &Message, _shutdown: &CancellationToken) -> Result<(), HandlerError> {
        let event = OrderPaidEvent::decode(&msg.value).map_err(NotifyError::from)?;
        let text = templates::order_paid(&event, Utc::now());

        if let Err(e) = self.notifier.send(&text).await {
            tracing::error!(order_id = %event.order_id, error = %e, "failed to send order paid notification");
            metrics::counter!("notifications_failed_total", "event" => "order_paid").increment(1);
            return Err(e.into());
        }

        metrics::counter!("notifications_sent_total", "event" => "order_paid").increment(1);
        Ok(())
    }
}

/// Notifies the user that an order was assembled.
pub struct OrderAssembledNotificationHandler<N> {
    notifier: N,
}

impl<N: Notifier> OrderAssembledNotificationHandler<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<N: Notifier> MessageHandler for OrderAssembledNotificationHandler<N> {
    async fn handle(&self, msg: &Message, _shutdown: &CancellationToken) -> Result<(), HandlerError> {
        let event = OrderAssembledEvent::decode(&msg.value).map_err(NotifyError::from)?;
        let text = templates::order_assembled(&event);

        if let Err(e) = self.notifier.send(&text).await {
            tracing::error!(order_id = %event.order_id, error = %e, "failed to send order assembled notification");
            metrics::counter!("notifications_failed_total", "event" => "order_assembled").increment(1);
            return Err(e.into());
        }

        metrics::counter!("notifications_sent_total", "event" => "order_assembled").increment(1);
        Ok(())
    }
}
