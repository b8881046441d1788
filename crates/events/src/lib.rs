//! Integration events exchanged between the order, assembly and notification
//! services, and their protobuf encoding.

pub mod error;
pub mod order_assembled;
pub mod order_paid;
pub mod wire;

pub use error::{CodecError, Result};
pub use order_assembled::OrderAssembledEvent;
pub use order_paid::OrderPaidEvent;

/// Topic carrying [`OrderPaidEvent`] records.
pub const ORDER_PAID_TOPIC: &str = "order.paid";

/// Topic carrying [`OrderAssembledEvent`] records.
pub const ORDER_ASSEMBLED_TOPIC: &str = "order.assembled";

fn parse_id<T>(field: &'static str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    value
        .parse()
        .map_err(|source| CodecError::InvalidUuid { field, source })
}
