//! In-memory durable event store for tests and memory mode.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::events::{DurableEvent, QueuedRoomEvent};
use crate::domain::foundation::{EventId, RoomId, Timestamp};
use crate::ports::{DurableEventStore, DurableStoreError};

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, DurableEvent>,
    markers: Vec<QueuedRoomEvent>,
}

/// In-memory durable store. Inserting an existing id is a no-op, matching
/// the PostgreSQL adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDurableEventStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDurableEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored events of a room, ordered by creation time.
    pub async fn events_for(&self, room_id: RoomId) -> Vec<DurableEvent> {
        let tables = self.tables.read().await;
        let mut events: Vec<_> = tables
            .events
            .values()
            .filter(|e| e.room_id == room_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.created_at, e.id));
        events
    }

    pub async fn event_count(&self) -> usize {
        self.tables.read().await.events.len()
    }

    pub async fn markers_for(&self, room_id: RoomId) -> Vec<QueuedRoomEvent> {
        self.tables
            .read()
            .await
            .markers
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DurableEventStore for InMemoryDurableEventStore {
    async fn insert_batch(&self, events: &[DurableEvent]) -> Result<u64, DurableStoreError> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0u64;
        for event in events {
            if !tables.events.contains_key(&event.id) {
                tables.events.insert(event.id, event.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn append_marker(&self, marker: &QueuedRoomEvent) -> Result<(), DurableStoreError> {
        self.tables.write().await.markers.push(marker.clone());
        Ok(())
    }

    async fn last_drained_at(
        &self,
        room_id: RoomId,
    ) -> Result<Option<Timestamp>, DurableStoreError> {
        Ok(self
            .tables
            .read()
            .await
            .markers
            .iter()
            .filter(|m| m.room_id == room_id)
            .map(|m| m.created_at)
            .max())
    }
}
