//! In-memory entity store.
//!
//! Stands in for the relational room schema in tests and memory mode.
//! `apply` takes the write lock once, so a batch is visible all at once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::RoomId;
use crate::domain::room::{Entity, EntityKey, RoomQuestion, TrackedEntity};
use crate::ports::{EntityStore, EntityStoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    entities: Arc<RwLock<HashMap<EntityKey, Entity>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert entities directly, bypassing any change tracking.
    pub async fn seed<E: TrackedEntity>(&self, entity: E) {
        let entity = entity.into_entity();
        self.entities.write().await.insert(entity.key(), entity);
    }

    /// Typed read for assertions.
    pub async fn get<E: TrackedEntity>(&self, id: uuid::Uuid) -> Option<E> {
        self.entities
            .read()
            .await
            .get(&EntityKey::of::<E>(id))
            .and_then(E::from_entity)
            .cloned()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn load(&self, key: EntityKey) -> Result<Option<Entity>, EntityStoreError> {
        Ok(self.entities.read().await.get(&key).cloned())
    }

    async fn apply(&self, entities: &[Entity]) -> Result<(), EntityStoreError> {
        let mut stored = self.entities.write().await;
        for entity in entities {
            stored.insert(entity.key(), entity.clone());
        }
        Ok(())
    }

    async fn room_questions(&self, room_id: RoomId) -> Result<Vec<RoomQuestion>, EntityStoreError> {
        let stored = self.entities.read().await;
        let mut questions: Vec<RoomQuestion> = stored
            .values()
            .filter_map(RoomQuestion::from_entity)
            .filter(|q| q.room_id == room_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.id);
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::QuestionId;
    use crate::domain::room::Room;
    use crate::ports::load_typed;

    #[tokio::test]
    async fn apply_then_load_round_trips() {
        let store = InMemoryEntityStore::new();
        let room = Room::new("r");
        store.apply(&[room.clone().into_entity()]).await.unwrap();

        let loaded: Option<Room> = load_typed(&store, *room.id.as_uuid()).await.unwrap();
        assert_eq!(loaded, Some(room));
    }

    #[tokio::test]
    async fn room_questions_filters_by_room() {
        let store = InMemoryEntityStore::new();
        let room = RoomId::new();
        store.seed(RoomQuestion::new(room, QuestionId::new())).await;
        store.seed(RoomQuestion::new(room, QuestionId::new())).await;
        store.seed(RoomQuestion::new(RoomId::new(), QuestionId::new())).await;

        assert_eq!(store.room_questions(room).await.unwrap().len(), 2);
    }
}
