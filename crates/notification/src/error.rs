//! Notification error types.

use events::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid event payload: {0}")]
    Codec(#[from] CodecError),

    /// Carries no URL; the Bot API endpoint embeds the token.
    #[error("Notification request failed: {0}")]
    Http(reqwest::Error),

    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
