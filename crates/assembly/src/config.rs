//! Assembly service configuration loaded from environment variables.

use std::time::Duration;

/// Assembly service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `KAFKA_BROKERS` (default: `"localhost:9092"`)
/// - `ORDER_PAID_TOPIC` (default: `"order.paid"`)
/// - `ORDER_ASSEMBLED_TOPIC` (default: `"order.assembled"`)
/// - `ASSEMBLY_GROUP_ID` (default: `"assembly-order-paid"`)
/// - `BUILD_TIME_SEC`: simulated build duration (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub brokers: String,
    pub order_paid_topic: String,
    pub order_assembled_topic: String,
    pub group_id: String,
    pub build_time: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brokers: std::env::var("KAFKA_BROKERS").unwrap_or(defaults.brokers),
            order_paid_topic: std::env::var("ORDER_PAID_TOPIC").unwrap_or(defaults.order_paid_topic),
            order_assembled_topic: std::env::var("ORDER_ASSEMBLED_TOPIC")
                .unwrap_or(defaults.order_assembled_topic),
            group_id: std::env::var("ASSEMBLY_GROUP_ID").unwrap_or(defaults.group_id),
            build_time: std::env::var("BUILD_TIME_SEC")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.build_time),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            order_paid_topic: events::ORDER_PAID_TOPIC.to_string(),
            order_assembled_topic: events::ORDER_ASSEMBLED_TOPIC.to_string(),
            group_id: "assembly-order-paid".to_string(),
            build_time: Duration::from_secs(10),
        }
    }
}
