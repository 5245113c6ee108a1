//! EntityStore port - persistence for the tracked room entities.
//!
//! The relational schema and query layer for rooms are external; this port
//! exposes only what the change pipeline and the live handlers need.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, RoomId};
use crate::domain::room::{Entity, EntityKey, RoomQuestion, TrackedEntity};

/// Errors that can occur in entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum EntityStoreError {
    #[error("Entity not found: {0}")]
    NotFound(EntityKey),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<EntityStoreError> for DomainError {
    fn from(err: EntityStoreError) -> Self {
        match err {
            EntityStoreError::NotFound(key) => {
                DomainError::new(ErrorCode::EntityNotFound, format!("Entity not found: {}", key))
            }
            EntityStoreError::Database(msg) => DomainError::new(ErrorCode::DatabaseError, msg),
        }
    }
}

/// Port for tracked entity persistence.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load the committed value of an entity.
    async fn load(&self, key: EntityKey) -> Result<Option<Entity>, EntityStoreError>;

    /// Write all entities in one transaction (insert or replace by key).
    async fn apply(&self, entities: &[Entity]) -> Result<(), EntityStoreError>;

    /// All questions placed into a room.
    async fn room_questions(&self, room_id: RoomId) -> Result<Vec<RoomQuestion>, EntityStoreError>;
}

/// Typed convenience over [`EntityStore::load`].
pub async fn load_typed<E: TrackedEntity>(
    store: &dyn EntityStore,
    id: Uuid,
) -> Result<Option<E>, EntityStoreError> {
    let entity = store.load(EntityKey::of::<E>(id)).await?;
    Ok(entity.as_ref().and_then(E::from_entity).cloned())
}
