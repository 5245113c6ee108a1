//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// `$generator` picks the UUID version used by `new()`; event ids use v7 so
/// that ids sort in creation order.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $generator:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self($generator())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an interview room.
    RoomId,
    Uuid::new_v4
);

uuid_id!(
    /// Unique identifier for a user (participant of a room).
    UserId,
    Uuid::new_v4
);

uuid_id!(
    /// Unique identifier for a question attached to a room.
    RoomQuestionId,
    Uuid::new_v4
);

uuid_id!(
    /// Unique identifier for a question in the question bank.
    QuestionId,
    Uuid::new_v4
);

uuid_id!(
    /// Unique identifier for an expert's evaluation of a room question.
    EvaluationId,
    Uuid::new_v4
);

uuid_id!(
    /// Unique, creation-ordered identifier for a room event.
    EventId,
    Uuid::now_v7
);

uuid_id!(
    /// Unique identifier for one live transport connection.
    ConnectionId,
    Uuid::new_v4
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_generates_unique_values() {
        assert_ne!(RoomId::new(), RoomId::new());
    }

    #[test]
    fn room_id_round_trips_through_display_and_parse() {
        let id = RoomId::new();
        let parsed: RoomId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn event_ids_are_version_7() {
        assert_eq!(EventId::new().as_uuid().get_version_num(), 7);
    }

    #[test]
    fn ids_serialize_transparently() {
        let uuid = Uuid::new_v4();
        let id = RoomId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
