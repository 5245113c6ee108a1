//! The room event value and its construction helpers.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{DomainError, EventId, RoomId, Timestamp, UserId};

/// An immutable, ordered event that happened inside a room.
///
/// Events are created by whichever component derives them (a change
/// processor or a live-interaction handler) and are never mutated after
/// they are handed to the bus: stores only copy or project them.
///
/// `id` is a UUID v7, so ids created later in a process sort after ids
/// created earlier; ordering within a room is by `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    id: EventId,
    room_id: RoomId,
    event_type: String,
    payload: JsonValue,
    stateful: bool,
    created_by_id: Option<UserId>,
    created_at: Timestamp,
}

impl RoomEvent {
    /// Creates a new event stamped with a fresh id and the current time.
    pub fn new(
        room_id: RoomId,
        event_type: impl Into<String>,
        payload: JsonValue,
        stateful: bool,
    ) -> Self {
        Self {
            id: EventId::new(),
            room_id,
            event_type: event_type.into(),
            payload,
            stateful,
            created_by_id: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates an event from a serializable payload.
    pub fn from_payload<T: Serialize>(
        room_id: RoomId,
        event_type: impl Into<String>,
        payload: &T,
        stateful: bool,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(
            room_id,
            event_type,
            serde_json::to_value(payload)?,
            stateful,
        ))
    }

    /// Records the actor that caused the event.
    pub fn with_created_by(mut self, user_id: UserId) -> Self {
        self.created_by_id = Some(user_id);
        self
    }

    /// Overrides the creation time (replays and tests).
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn stateful(&self) -> bool {
        self.stateful
    }

    pub fn created_by_id(&self) -> Option<UserId> {
        self.created_by_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Deserialize payload to a specific type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
