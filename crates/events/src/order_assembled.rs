//! `ShipAssembled` event.

use common::{EventId, OrderId, UserId};
use prost::Message as _;

use crate::error::Result;
use crate::parse_id;
use crate::wire;

/// Emitted by the assembly service once an order has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAssembledEvent {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub build_time_sec: i64,
}

impl OrderAssembledEvent {
    pub fn encode(&self) -> Vec<u8> {
        wire::ShipAssembled {
            event_uuid: self.event_id.to_string(),
            order_uuid: self.order_id.to_string(),
            user_uuid: self.user_id.to_string(),
            build_time_sec: self.build_time_sec,
        }
        .encode_to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let raw = wire::ShipAssembled::decode(bytes)?;

        Ok(Self {
            event_id: parse_id("event_uuid", &raw.event_uuid)?,
            order_id: parse_id("order_uuid", &raw.order_uuid)?,
            user_id: parse_id("user_uuid", &raw.user_uuid)?,
            build_time_sec: raw.build_time_sec,
        })
    }
}
