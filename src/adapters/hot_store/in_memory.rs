//! In-memory hot event store.
//!
//! Events are kept per room in creation order. Suitable for tests and for
//! single-process deployments that do not need hot events to survive a
//! restart.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::events::{EventSpec, RoomEvent};
use crate::domain::foundation::{EventId, RoomId};
use crate::ports::{HotEventStore, HotStoreError};

/// In-memory hot event store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHotEventStore {
    rooms: Arc<RwLock<BTreeMap<RoomId, Vec<RoomEvent>>>>,
}

impl InMemoryHotEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged events for a room.
    pub async fn len(&self, room_id: RoomId) -> usize {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Total staged events across rooms.
    pub async fn total(&self) -> usize {
        self.rooms.read().await.values().map(Vec::len).sum()
    }
}

fn order_key(event: &RoomEvent) -> (crate::domain::foundation::Timestamp, EventId) {
    (event.created_at(), event.id())
}

#[async_trait]
impl HotEventStore for InMemoryHotEventStore {
    async fn append(&self, event: &RoomEvent) -> Result<(), HotStoreError> {
        let mut rooms = self.rooms.write().await;
        let events = rooms.entry(event.room_id()).or_default();
        let key = order_key(event);
        let position = events.partition_point(|e| order_key(e) <= key);
        events.insert(position, event.clone());
        Ok(())
    }

    async fn fetch_page(
        &self,
        spec: &EventSpec,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .get(&spec.room_id())
            .map(|events| {
                events
                    .iter()
                    .filter(|e| spec.matches(e))
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_latest(
        &self,
        spec: &EventSpec,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .get(&spec.room_id())
            .map(|events| {
                events
                    .iter()
                    .rev()
                    .filter(|e| spec.matches(e))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, events: &[RoomEvent]) -> Result<u64, HotStoreError> {
        let mut by_room: BTreeMap<RoomId, HashSet<EventId>> = BTreeMap::new();
        for event in events {
            by_room.entry(event.room_id()).or_default().insert(event.id());
        }

        let mut rooms = self.rooms.write().await;
        let mut removed = 0u64;
        for (room_id, ids) in by_room {
            if let Some(stored) = rooms.get_mut(&room_id) {
                let before = stored.len();
                stored.retain(|e| !ids.contains(&e.id()));
                removed += (before - stored.len()) as u64;
                if stored.is_empty() {
                    rooms.remove(&room_id);
                }
            }
        }
        Ok(removed)
    }

    async fn pending_rooms(
        &self,
        after: Option<RoomId>,
        limit: usize,
    ) -> Result<Vec<RoomId>, HotStoreError> {
        let rooms = self.rooms.read().await;
        let lower = match after {
            Some(room_id) => Bound::Excluded(room_id),
            None => Bound::Unbounded,
        };
        Ok(rooms
            .range((lower, Bound::Unbounded))
            .filter(|(_, events)| !events.is_empty())
            .map(|(room_id, _)| *room_id)
            .take(limit)
            .collect())
    }
}
