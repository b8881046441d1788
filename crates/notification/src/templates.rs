//! User-facing message text.

use chrono::{DateTime, Utc};
use events::{OrderAssembledEvent, OrderPaidEvent};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn order_paid(event: &OrderPaidEvent, paid_at: DateTime<Utc>) -> String {
    format!(
        "Order paid\n\
         Order: {}\n\
         Transaction: {}\n\
         Payment method: {}\n\
         Date: {}",
        event.order_id,
        event.transaction_id,
        event.payment_method,
        paid_at.format(DATE_FORMAT),
    )
}

pub fn order_assembled(event: &OrderAssembledEvent) -> String {
    format!(
        "Order assembled\n\
         Order: {}\n\
         Build time: {} s",
        event.order_id, event.build_time_sec,
    )
}
