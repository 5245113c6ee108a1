//! Query specification for hot-stored room events.

use crate::domain::foundation::{RoomId, Timestamp};

use super::RoomEvent;

/// Filter over the events of one room.
///
/// A spec is always scoped to a single room; the remaining criteria are
/// optional and combined with AND. The time window is half-open:
/// `created_after <= created_at < created_before`.
///
/// # Example
///
/// ```ignore
/// let spec = EventSpec::for_room(room_id)
///     .of_type(event_types::CHANGE_CODE_EDITOR)
///     .stateful_only()
///     .created_after(since);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EventSpec {
    room_id: RoomId,
    event_types: Option<Vec<String>>,
    stateful: Option<bool>,
    created_after: Option<Timestamp>,
    created_before: Option<Timestamp>,
}

impl EventSpec {
    /// Matches every event of the room.
    pub fn for_room(room_id: RoomId) -> Self {
        Self {
            room_id,
            event_types: None,
            stateful: None,
            created_after: None,
            created_before: None,
        }
    }

    /// Restricts to one event type. Repeated calls widen the set.
    pub fn of_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types
            .get_or_insert_with(Vec::new)
            .push(event_type.into());
        self
    }

    /// Restricts to stateful events.
    pub fn stateful_only(mut self) -> Self {
        self.stateful = Some(true);
        self
    }

    /// Restricts to events created at or after `at`.
    pub fn created_after(mut self, at: Timestamp) -> Self {
        self.created_after = Some(at);
        self
    }

    /// Restricts to events created strictly before `at`.
    pub fn created_before(mut self, at: Timestamp) -> Self {
        self.created_before = Some(at);
        self
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn event_types(&self) -> Option<&[String]> {
        self.event_types.as_deref()
    }

    pub fn window(&self) -> (Option<Timestamp>, Option<Timestamp>) {
        (self.created_after, self.created_before)
    }

    /// True when only the room and time window constrain the query, so a
    /// store can page on its time index without post-filtering.
    pub fn is_window_only(&self) -> bool {
        self.event_types.is_none() && self.stateful.is_none()
    }

    /// Checks whether an event satisfies every criterion.
    pub fn matches(&self, event: &RoomEvent) -> bool {
        if event.room_id() != self.room_id {
            return false;
        }
        if let Some(types) = &self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }
        if let Some(stateful) = self.stateful {
            if event.stateful() != stateful {
                return false;
            }
        }
        let created_at = event.created_at();
        if let Some(after) = self.created_after {
            if created_at.is_before(&after) {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if !created_at.is_before(&before) {
                return false;
            }
        }
        true
    }
}
