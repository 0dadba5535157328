//! In-memory event ownership lookup
//!
//! Maps event IDs to the client who organised them. Used as the
//! [`EventOwnerResolver`] for the batch driver and in tests.

use super::traits::EventOwnerResolver;
use crate::types::{ClientId, EventId, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct InMemoryEventDirectory {
    owners: DashMap<EventId, ClientId>,
}

impl InMemoryEventDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `client_id` as the owner of `event_id`
    pub fn register(&self, event_id: EventId, client_id: ClientId) {
        self.owners.insert(event_id, client_id);
    }
}

#[async_trait]
impl EventOwnerResolver for InMemoryEventDirectory {
    async fn resolve_owner(&self, event_id: EventId) -> Result<ClientId, StoreError> {
        self.owners
            .get(&event_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| StoreError::not_found("event", event_id))
    }
}
