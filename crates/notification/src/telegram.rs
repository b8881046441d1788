//! Telegram Bot API notifier.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::TelegramConfig;
use crate::error::{NotifyError, Result};
use crate::notifier::Notifier;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts notifications to a chat through `sendMessage`.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_api_url(config, DEFAULT_API_URL)
    }

    /// Targets a different Bot API host, e.g. a local stub.
    pub fn with_api_url(config: &TelegramConfig, api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_url.trim_end_matches('/'),
                config.token
            ),
            chat_id: config.chat_id.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[tracing::instrument(skip_all, fields(chat_id = %self.chat_id))]
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("telegram message sent");
        Ok(())
    }
}
