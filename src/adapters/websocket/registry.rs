//! In-process connection registry.
//!
//! Registrations are grouped by room so fan-out only touches the room's own
//! entries. A reverse index from connection id to room makes `unregister`
//! independent of the caller knowing the room.
//!
//! ```text
//! rooms:        room-1 -> [conn-a, conn-b]    room-2 -> [conn-c]
//! connections:  conn-a -> room-1, conn-b -> room-1, conn-c -> room-2
//! ```

use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::foundation::{ConnectionId, RoomId, UserId};
use crate::domain::room::ParticipantType;
use crate::ports::{ConnectionRegistration, ConnectionRegistry, TransportConnection};

/// Connection registry backed by concurrent maps.
///
/// Lookups clone the room's registrations under a shard read lock and
/// return the snapshot, so callers never hold a map lock while sending.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    rooms: DashMap<RoomId, Vec<ConnectionRegistration>>,
    connections: DashMap<ConnectionId, RoomId>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms with at least one live connection.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn register(
        &self,
        room_id: RoomId,
        user_id: UserId,
        participant_type: ParticipantType,
        connection: Arc<dyn TransportConnection>,
    ) -> ConnectionRegistration {
        let registration = ConnectionRegistration::new(room_id, user_id, participant_type, connection);
        let connection_id = registration.connection_id();

        self.unregister(connection_id);
        self.rooms
            .entry(room_id)
            .or_default()
            .push(registration.clone());
        self.connections.insert(connection_id, room_id);

        tracing::debug!(
            room_id = %room_id,
            user_id = %user_id,
            connection_id = %connection_id,
            participant_type = %participant_type,
            "Connection registered"
        );
        registration
    }

    fn unregister(&self, connection_id: ConnectionId) -> Option<ConnectionRegistration> {
        let (_, room_id) = self.connections.remove(&connection_id)?;

        let removed = self.rooms.get_mut(&room_id).and_then(|mut registrations| {
            let position = registrations
                .iter()
                .position(|r| r.connection_id() == connection_id)?;
            Some(registrations.remove(position))
        });
        self.rooms.remove_if(&room_id, |_, registrations| registrations.is_empty());

        if removed.is_some() {
            tracing::debug!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Connection unregistered"
            );
        }
        removed
    }

    fn find_by_room(&self, room_id: RoomId) -> Vec<ConnectionRegistration> {
        self.rooms
            .get(&room_id)
            .map(|registrations| registrations.clone())
            .unwrap_or_default()
    }

    fn find_by_predicate(
        &self,
        room_id: RoomId,
        predicate: &dyn Fn(&ConnectionRegistration) -> bool,
    ) -> Vec<ConnectionRegistration> {
        self.rooms
            .get(&room_id)
            .map(|registrations| {
                registrations
                    .iter()
                    .filter(|r| predicate(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_by_user_and_room(
        &self,
        user_id: UserId,
        room_id: RoomId,
    ) -> Vec<ConnectionRegistration> {
        self.find_by_predicate(room_id, &|r: &ConnectionRegistration| r.user_id == user_id)
    }

    fn connection_count(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map(|r| r.len()).unwrap_or(0)
    }
}

/// Ready-made predicates for targeted delivery.
pub mod filters {
    use crate::domain::foundation::UserId;
    use crate::domain::room::ParticipantType;
    use crate::ports::ConnectionRegistration;

    /// Every connection of one user.
    pub fn user(user_id: UserId) -> impl Fn(&ConnectionRegistration) -> bool + Send + Sync {
        move |r| r.user_id == user_id
    }

    /// Every connection of one participant kind.
    pub fn participant(
        kind: ParticipantType,
    ) -> impl Fn(&ConnectionRegistration) -> bool + Send + Sync {
        move |r| r.participant_type == kind
    }

    /// Experts other than `user_id`.
    pub fn experts_except(
        user_id: UserId,
    ) -> impl Fn(&ConnectionRegistration) -> bool + Send + Sync {
        move |r| r.participant_type == ParticipantType::Expert && r.user_id != user_id
    }

    /// Everyone in the room except `user_id`.
    pub fn everyone_except(
        user_id: UserId,
    ) -> impl Fn(&ConnectionRegistration) -> bool + Send + Sync {
        move |r| r.user_id != user_id
    }
}
