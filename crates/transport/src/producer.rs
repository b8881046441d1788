//! Topic-bound producer abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Publishes records to a single topic.
///
/// `send` resolves once the broker has accepted the record.
#[async_trait]
pub trait Producer: Send + Sync {
    fn topic(&self) -> &str;

    async fn send(&self, key: &[u8], value: &[u8]) -> Result<()>;
}

#[async_trait]
impl<P: Producer + ?Sized> Producer for Arc<P> {
    fn topic(&self) -> &str {
        (**self).topic()
    }

    async fn send(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).send(key, value).await
    }
}
