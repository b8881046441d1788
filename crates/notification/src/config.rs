//! Notification service configuration loaded from environment variables.

/// Telegram bot credentials.
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Notification service configuration.
///
/// Reads from environment variables:
/// - `KAFKA_BROKERS` (default: `"localhost:9092"`)
/// - `ORDER_PAID_TOPIC` (default: `"order.paid"`)
/// - `ORDER_ASSEMBLED_TOPIC` (default: `"order.assembled"`)
/// - `NOTIFICATION_PAID_GROUP_ID` (default: `"notification-order-paid"`)
/// - `NOTIFICATION_ASSEMBLED_GROUP_ID` (default: `"notification-order-assembled"`)
/// - `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`: both set enables Telegram,
///   otherwise notifications are only logged
#[derive(Debug, Clone)]
pub struct Config {
    pub brokers: String,
    pub order_paid_topic: String,
    pub order_assembled_topic: String,
    pub paid_group_id: String,
    pub assembled_group_id: String,
    pub telegram: Option<TelegramConfig>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let telegram = match (
            std::env::var("TELEGRAM_BOT_TOKEN"),
            std::env::var("TELEGRAM_CHAT_ID"),
        ) {
            (Ok(token), Ok(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramConfig { token, chat_id })
            }
            _ => None,
        };

        Self {
            brokers: std::env::var("KAFKA_BROKERS").unwrap_or(defaults.brokers),
            order_paid_topic: std::env::var("ORDER_PAID_TOPIC").unwrap_or(defaults.order_paid_topic),
            order_assembled_topic: std::env::var("ORDER_ASSEMBLED_TOPIC")
                .unwrap_or(defaults.order_assembled_topic),
            paid_group_id: std::env::var("NOTIFICATION_PAID_GROUP_ID")
                .unwrap_or(defaults.paid_group_id),
            assembled_group_id: std::env::var("NOTIFICATION_ASSEMBLED_GROUP_ID")
                .unwrap_or(defaults.assembled_group_id),
            telegram,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            order_paid_topic: events::ORDER_PAID_TOPIC.to_string(),
            order_assembled_topic: events::ORDER_ASSEMBLED_TOPIC.to_string(),
            paid_group_id: "notification-order-paid".to_string(),
            assembled_group_id: "notification-order-assembled".to_string(),
            telegram: None,
        }
    }
}
