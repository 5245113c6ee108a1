//! The room aggregate root and its status lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::RoomId;

/// Lifecycle status of an interview room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomStatus {
    New,
    Active,
    Review,
    Close,
}

impl RoomStatus {
    /// True once the room no longer accepts live interaction.
    pub fn is_closed(&self) -> bool {
        matches!(self, RoomStatus::Close)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomStatus::New => "New",
            RoomStatus::Active => "Active",
            RoomStatus::Review => "Review",
            RoomStatus::Close => "Close",
        };
        write!(f, "{}", s)
    }
}

/// An interview room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub status: RoomStatus,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(),
            name: name.into(),
            status: RoomStatus::New,
        }
    }

    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_starts_in_new_status() {
        let room = Room::new("Backend interview");
        assert_eq!(room.status, RoomStatus::New);
        assert!(!room.status.is_closed());
    }

    #[test]
    fn status_serializes_as_pascal_case_tag() {
        assert_eq!(serde_json::to_string(&RoomStatus::Close).unwrap(), "\"Close\"");
        assert_eq!(RoomStatus::Review.to_string(), "Review");
    }
}
