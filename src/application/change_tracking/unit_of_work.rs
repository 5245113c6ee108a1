//! UnitOfWork - explicit change tracking for room entities.
//!
//! Entities enter the unit of work by being added, loaded or updated. At
//! commit, every entry that is added or differs from its loaded original is
//! snapshotted into a [`Change`] and handed to the [`ChangePipeline`].
//!
//! ```ignore
//! let mut uow = factory.begin().with_actor(user_id);
//! let mut room: Room = uow.load(room_id.into()).await?.ok_or(..)?;
//! room.status = RoomStatus::Close;
//! uow.update(room).await?;
//! uow.commit().await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::room::{Entity, EntityKey, TrackedEntity};
use crate::ports::EntityStore;

use super::{Change, ChangePipeline, CommitSummary};

/// Tracking state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
    Unchanged,
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    state: EntryState,
    original: Option<Entity>,
    current: Entity,
}

/// Creates units of work bound to one store and pipeline.
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    store: Arc<dyn EntityStore>,
    pipeline: Arc<ChangePipeline>,
}

impl UnitOfWorkFactory {
    pub fn new(store: Arc<dyn EntityStore>, pipeline: Arc<ChangePipeline>) -> Self {
        Self { store, pipeline }
    }

    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(self.store.clone(), self.pipeline.clone())
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }
}

/// A set of tracked entity changes committed together.
pub struct UnitOfWork {
    store: Arc<dyn EntityStore>,
    pipeline: Arc<ChangePipeline>,
    actor: Option<UserId>,
    entries: Vec<TrackedEntry>,
    index: HashMap<EntityKey, usize>,
}

impl UnitOfWork {
    pub fn new(store: Arc<dyn EntityStore>, pipeline: Arc<ChangePipeline>) -> Self {
        Self {
            store,
            pipeline,
            actor: None,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Attribute events derived from this commit to a user.
    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Track a new entity.
    ///
    /// Adding an entity that is already tracked behaves like `update`.
    pub fn add<E: TrackedEntity>(&mut self, entity: E) {
        let entity = entity.into_entity();
        let key = entity.key();
        if let Some(&position) = self.index.get(&key) {
            self.replace(position, entity);
            return;
        }
        self.push(TrackedEntry {
            state: EntryState::Added,
            original: None,
            current: entity,
        });
    }

    /// Load and track an entity. Returns the tracked current value if the
    /// entity is already in this unit of work.
    pub async fn load<E: TrackedEntity>(&mut self, id: Uuid) -> Result<Option<E>, DomainError> {
        let key = EntityKey::of::<E>(id);
        if let Some(&position) = self.index.get(&key) {
            return Ok(E::from_entity(&self.entries[position].current).cloned());
        }

        let Some(entity) = self.store.load(key).await? else {
            return Ok(None);
        };
        let typed = E::from_entity(&entity).cloned();
        self.push(TrackedEntry {
            state: EntryState::Unchanged,
            original: Some(entity.clone()),
            current: entity,
        });
        Ok(typed)
    }

    /// Load an entity that must exist.
    pub async fn get<E: TrackedEntity>(&mut self, id: Uuid) -> Result<E, DomainError> {
        self.load::<E>(id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::EntityNotFound,
                format!("Entity not found: {}", EntityKey::of::<E>(id)),
            )
        })
    }

    /// Record a new value for an entity.
    ///
    /// An untracked entity is attached against its committed row: it becomes
    /// modified if the row exists, added otherwise. An added entity stays
    /// added however often it is updated.
    pub async fn update<E: TrackedEntity>(&mut self, entity: E) -> Result<(), DomainError> {
        let entity = entity.into_entity();
        let key = entity.key();
        if let Some(&position) = self.index.get(&key) {
            self.replace(position, entity);
            return Ok(());
        }

        match self.store.load(key).await? {
            Some(original) => {
                let state = if original == entity {
                    EntryState::Unchanged
                } else {
                    EntryState::Modified
                };
                self.push(TrackedEntry {
                    state,
                    original: Some(original),
                    current: entity,
                });
            }
            None => self.push(TrackedEntry {
                state: EntryState::Added,
                original: None,
                current: entity,
            }),
        }
        Ok(())
    }

    /// Tracking state of an entity, if tracked.
    pub fn state_of(&self, key: EntityKey) -> Option<EntryState> {
        self.index.get(&key).map(|&i| self.entries[i].state)
    }

    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|e| e.state != EntryState::Unchanged)
    }

    /// Snapshot of added and modified entries in tracking order.
    pub fn changes(&self) -> Vec<Change> {
        self.entries
            .iter()
            .filter_map(|entry| match (entry.state, &entry.original) {
                (EntryState::Added, _) => Some(Change::Added(entry.current.clone())),
                (EntryState::Modified, Some(original)) => Some(Change::Modified {
                    original: original.clone(),
                    current: entry.current.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Commit through the pipeline.
    pub async fn commit(self) -> Result<CommitSummary, DomainError> {
        let changes = self.changes();
        self.pipeline
            .commit(self.store.as_ref(), changes, self.actor)
            .await
    }

    fn push(&mut self, entry: TrackedEntry) {
        self.index.insert(entry.current.key(), self.entries.len());
        self.entries.push(entry);
    }

    fn replace(&mut self, position: usize, entity: Entity) {
        let entry = &mut self.entries[position];
        entry.current = entity;
        if entry.state != EntryState::Added {
            entry.state = match &entry.original {
                Some(original) if *original == entry.current => EntryState::Unchanged,
                _ => EntryState::Modified,
            };
        }
    }
}
