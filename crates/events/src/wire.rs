//! Protobuf messages as they appear on the wire.
//!
//! Identifiers travel as canonical UUID strings.

/// Payload of the `order.paid` topic.
#[derive(Clone, PartialEq, prost::Message)]
pub struct OrderPaid {
    #[prost(string, tag = "1")]
    pub event_uuid: String,
    #[prost(string, tag = "2")]
    pub order_uuid: String,
    #[prost(string, tag = "3")]
    pub user_uuid: String,
    #[prost(string, tag = "4")]
    pub payment_method: String,
    #[prost(string, tag = "5")]
    pub transaction_uuid: String,
}

/// Payload of the `order.assembled` topic.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ShipAssembled {
    #[prost(string, tag = "1")]
    pub event_uuid: String,
    #[prost(string, tag = "2")]
    pub order_uuid: String,
    #[prost(string, tag = "3")]
    pub user_uuid: String,
    #[prost(int64, tag = "4")]
    pub build_time_sec: i64,
}
