//! ConnectionRegistry port - live transport endpoints per room.
//!
//! A participant gets one registration per open connection, so a user with
//! two browser tabs appears twice. Lookups return owned snapshots: callers
//! iterate them while other participants join and leave.

use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::{ConnectionId, RoomId, Timestamp, UserId};
use crate::domain::room::ParticipantType;

use super::TransportConnection;

/// A live connection bound to a room participant.
#[derive(Clone)]
pub struct ConnectionRegistration {
    pub connection: Arc<dyn TransportConnection>,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub participant_type: ParticipantType,
    pub connected_at: Timestamp,
}

impl ConnectionRegistration {
    pub fn new(
        room_id: RoomId,
        user_id: UserId,
        participant_type: ParticipantType,
        connection: Arc<dyn TransportConnection>,
    ) -> Self {
        Self {
            connection,
            room_id,
            user_id,
            participant_type,
            connected_at: Timestamp::now(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }
}

impl fmt::Debug for ConnectionRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistration")
            .field("connection_id", &self.connection_id())
            .field("room_id", &self.room_id)
            .field("user_id", &self.user_id)
            .field("participant_type", &self.participant_type)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

/// Port for tracking live connections in this process.
///
/// Operations are synchronous and infallible: the registry is an
/// in-memory index over sockets owned by this server.
pub trait ConnectionRegistry: Send + Sync {
    /// Add a registration. Registering the same connection twice replaces
    /// the earlier entry.
    fn register(
        &self,
        room_id: RoomId,
        user_id: UserId,
        participant_type: ParticipantType,
        connection: Arc<dyn TransportConnection>,
    ) -> ConnectionRegistration;

    /// Remove a connection. Returns the removed registration, if any.
    fn unregister(&self, connection_id: ConnectionId) -> Option<ConnectionRegistration>;

    /// Every live connection in the room.
    fn find_by_room(&self, room_id: RoomId) -> Vec<ConnectionRegistration>;

    /// Connections in the room accepted by the predicate.
    fn find_by_predicate(
        &self,
        room_id: RoomId,
        predicate: &dyn Fn(&ConnectionRegistration) -> bool,
    ) -> Vec<ConnectionRegistration>;

    /// Connections of one user in one room.
    fn find_by_user_and_room(&self, user_id: UserId, room_id: RoomId)
        -> Vec<ConnectionRegistration>;

    /// Number of live connections in the room.
    fn connection_count(&self, room_id: RoomId) -> usize;
}
