//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Order service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `KAFKA_BROKERS` (default: `"localhost:9092"`)
/// - `ORDER_PAID_TOPIC` (default: `"order.paid"`)
/// - `ORDER_ASSEMBLED_TOPIC` (default: `"order.assembled"`)
/// - `ORDER_GROUP_ID`: consumer group for assembled events (default: `"order-order-assembled"`)
/// - `DATABASE_URL`: Postgres connection string; orders are kept in memory when unset
/// - `CALL_TIMEOUT_MS`: bound on each Inventory/Payment call (default: `3000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub brokers: String,
    pub order_paid_topic: String,
    pub order_assembled_topic: String,
    pub group_id: String,
    pub database_url: Option<String>,
    pub call_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            brokers: std::env::var("KAFKA_BROKERS").unwrap_or(defaults.brokers),
            order_paid_topic: std::env::var("ORDER_PAID_TOPIC").unwrap_or(defaults.order_paid_topic),
            order_assembled_topic: std::env::var("ORDER_ASSEMBLED_TOPIC")
                .unwrap_or(defaults.order_assembled_topic),
            group_id: std::env::var("ORDER_GROUP_ID").unwrap_or(defaults.group_id),
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            call_timeout: std::env::var("CALL_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.call_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            brokers: "localhost:9092".to_string(),
            order_paid_topic: events::ORDER_PAID_TOPIC.to_string(),
            order_assembled_topic: events::ORDER_ASSEMBLED_TOPIC.to_string(),
            group_id: "order-order-assembled".to_string(),
            database_url: None,
            call_timeout: saga::DEFAULT_CALL_TIMEOUT,
        }
    }
}
