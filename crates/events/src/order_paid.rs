//! `OrderPaid` event.

use common::{EventId, OrderId, TransactionId, UserId};
use prost::Message as _;

use crate::error::Result;
use crate::parse_id;
use crate::wire;

/// Emitted once an order's payment has been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPaidEvent {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Wire form of the payment method, e.g. `CARD`.
    pub payment_method: String,
    pub transaction_id: TransactionId,
}

impl OrderPaidEvent {
    /// Encodes the event as protobuf bytes.
    pub fn encode(&self) -> Vec<u8> {
        wire::OrderPaid {
            event_uuid: self.event_id.to_string(),
            order_uuid: self.order_id.to_string(),
            user_uuid: self.user_id.to_string(),
            payment_method: self.payment_method.clone(),
            transaction_uuid: self.transaction_id.to_string(),
        }
        .encode_to_vec()
    }

    /// Decodes protobuf bytes, validating every identifier.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let raw = wire::OrderPaid::decode(bytes)?;

        Ok(Self {
            event_id: parse_id("event_uuid", &raw.event_uuid)?,
            order_id: parse_id("order_uuid", &raw.order_uuid)?,
            user_id: parse_id("user_uuid", &raw.user_uuid)?,
            payment_method: raw.payment_method,
            transaction_id: parse_id("transaction_uuid", &raw.transaction_uuid)?,
        })
    }
}
