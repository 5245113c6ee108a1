//! Cold-storage projections of room events.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::foundation::{EventId, RoomId, Timestamp, UserId};

use super::RoomEvent;

/// Permanent copy of a room event, written once by the drain service.
///
/// The primary id is preserved from the hot-stored event so a re-attempted
/// chunk can be recognised by the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableEvent {
    pub id: EventId,
    pub room_id: RoomId,
    pub event_type: String,
    pub stateful: bool,
    pub payload: JsonValue,
    pub created_by_id: Option<UserId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DurableEvent {
    /// Projects a hot event into its durable form, stamped with the
    /// migration time.
    pub fn from_room_event(event: &RoomEvent, migrated_at: Timestamp) -> Self {
        Self {
            id: event.id(),
            room_id: event.room_id(),
            event_type: event.event_type().to_string(),
            stateful: event.stateful(),
            payload: event.payload().clone(),
            created_by_id: event.created_by_id(),
            created_at: event.created_at(),
            updated_at: migrated_at,
        }
    }
}

/// Marker row: this room's hot events were fully drained as of `created_at`.
///
/// A new marker is appended after every successful drain of the room; the
/// newest one is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRoomEvent {
    pub id: Uuid,
    pub room_id: RoomId,
    pub created_at: Timestamp,
}

impl QueuedRoomEvent {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            created_at: Timestamp::now(),
        }
    }
}
