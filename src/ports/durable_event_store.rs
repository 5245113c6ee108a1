//! DurableEventStore port - permanent archive of drained room events.

use async_trait::async_trait;

use crate::domain::events::{DurableEvent, QueuedRoomEvent};
use crate::domain::foundation::{DomainError, ErrorCode, RoomId, Timestamp};

/// Errors that can occur in durable store operations.
#[derive(Debug, thiserror::Error)]
pub enum DurableStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<DurableStoreError> for DomainError {
    fn from(err: DurableStoreError) -> Self {
        match err {
            DurableStoreError::Database(msg) => DomainError::new(ErrorCode::DatabaseError, msg),
            DurableStoreError::Serialization(msg) => {
                DomainError::new(ErrorCode::SerializationError, msg)
            }
        }
    }
}

/// Port for durable event storage.
///
/// Implementations must make `insert_batch` all-or-nothing: either every
/// event of the chunk is persisted or the call fails. Re-inserting an event
/// whose id already exists is not an error.
#[async_trait]
pub trait DurableEventStore: Send + Sync {
    /// Persist a chunk of events. Returns the number of newly stored rows.
    async fn insert_batch(&self, events: &[DurableEvent]) -> Result<u64, DurableStoreError>;

    /// Record that a room has been fully drained.
    async fn append_marker(&self, marker: &QueuedRoomEvent) -> Result<(), DurableStoreError>;

    /// Time of the newest drain marker for the room, if any.
    async fn last_drained_at(&self, room_id: RoomId)
        -> Result<Option<Timestamp>, DurableStoreError>;
}
