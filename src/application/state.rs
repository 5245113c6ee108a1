//! RoomStateReader - what a participant joining late needs to see.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use crate::domain::events::{EventSpec, RoomEvent};
use crate::domain::foundation::{DomainError, RoomId, Timestamp};
use crate::ports::HotEventStore;

/// Default number of stateful events scanned for the latest state.
pub const DEFAULT_STATE_SCAN_LIMIT: usize = 500;

/// Reads current room state from hot storage.
pub struct RoomStateReader {
    hot_store: Arc<dyn HotEventStore>,
    scan_limit: usize,
}

impl RoomStateReader {
    pub fn new(hot_store: Arc<dyn HotEventStore>) -> Self {
        Self {
            hot_store,
            scan_limit: DEFAULT_STATE_SCAN_LIMIT,
        }
    }

    pub fn with_scan_limit(mut self, limit: usize) -> Self {
        self.scan_limit = limit.max(1);
        self
    }

    /// Newest stateful event of each type, oldest first so a client can
    /// apply them in order.
    pub async fn latest_state(&self, room_id: RoomId) -> Result<Vec<RoomEvent>, DomainError> {
        let spec = EventSpec::for_room(room_id).stateful_only();
        let newest_first = self.hot_store.get_latest(&spec, self.scan_limit).await?;

        let mut seen = HashSet::new();
        let mut latest: Vec<RoomEvent> = newest_first
            .into_iter()
            .filter(|event| seen.insert(event.event_type().to_string()))
            .collect();
        latest.reverse();
        Ok(latest)
    }

    /// Up to `limit` most recent events created within `window` of now,
    /// newest first.
    pub async fn recent(
        &self,
        room_id: RoomId,
        window: Duration,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, DomainError> {
        let spec = EventSpec::for_room(room_id).created_after(Timestamp::now().minus(window));
        Ok(self.hot_store.get_latest(&spec, limit).await?)
    }
}
