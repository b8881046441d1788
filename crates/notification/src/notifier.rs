//! Delivery channels for notifications.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{NotifyError, Result};

/// Sends a text message to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    async fn send(&self, text: &str) -> Result<()> {
        (**self).send(text).await
    }
}

/// Writes notifications to the log. Used when no Telegram bot is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        tracing::info!(%text, "notification");
        Ok(())
    }
}

#[derive(Default)]
struct State {
    sent: Vec<String>,
    fail_on_send: bool,
}

/// In-memory notifier for tests.
#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<Mutex<State>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_send(&self, fail: bool) {
        self.lock().fail_on_send = fail;
    }

    /// Returns every message sent so far, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let mut state = self.lock();
        if state.fail_on_send {
            return Err(NotifyError::Unavailable("simulated failure".to_string()));
        }
        state.sent.push(text.to_string());
        Ok(())
    }
}
