//! Inventory client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::PartId;
use domain::Part;

use super::ClientError;

/// Selects catalog parts by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartsFilter {
    pub ids: Vec<PartId>,
}

/// Read-only access to the part catalog.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Returns the parts matching `filter`. Unknown ids are simply absent
    /// from the result.
    async fn list_parts(&self, filter: PartsFilter) -> Result<Vec<Part>, ClientError>;
}

#[async_trait]
impl<I: InventoryClient + ?Sized> InventoryClient for Arc<I> {
    async fn list_parts(&self, filter: PartsFilter) -> Result<Vec<Part>, ClientError> {
        (**self).list_parts(filter).await
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    parts: HashMap<PartId, Part>,
    calls: usize,
    delay: Option<Duration>,
    fail_on_list: bool,
}

/// In-memory part catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding `parts`.
    pub fn with_parts(parts: impl IntoIterator<Item = Part>) -> Self {
        let client = Self::new();
        for part in parts {
            client.add_part(part);
        }
        client
    }

    pub fn add_part(&self, part: Part) {
        self.write().parts.insert(part.id, part);
    }

    /// Configures the catalog to fail every lookup.
    pub fn set_fail_on_list(&self, fail: bool) {
        self.write().fail_on_list = fail;
    }

    /// Delays every lookup, to exercise caller timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.write().delay = delay;
    }

    /// Returns the number of lookups made so far.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryInventoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn list_parts(&self, filter: PartsFilter) -> Result<Vec<Part>, ClientError> {
        let delay = {
            let mut state = self.write();
            state.calls += 1;
            if state.fail_on_list {
                return Err(ClientError::Unavailable("inventory is down".to_string()));
            }
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(filter
            .ids
            .iter()
            .filter_map(|id| state.parts.get(id).cloned())
            .collect())
    }
}
