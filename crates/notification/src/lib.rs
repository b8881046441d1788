//! Notification service.
//!
//! Listens to `OrderPaid` and `OrderAssembled` and tells the user about each,
//! through Telegram when a bot is configured and through the log otherwise.

pub mod config;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod telegram;
pub mod templates;

pub use config::{Config, TelegramConfig};
pub use error::{NotifyError, Result};
pub use handlers::{OrderAssembledNotificationHandler, OrderPaidNotificationHandler};
pub use notifier::{InMemoryNotifier, LogNotifier, Notifier};
pub use telegram::TelegramNotifier;
