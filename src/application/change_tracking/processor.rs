//! Processor traits and the contexts they run in.
//!
//! Processors are written against one concrete entity type and registered
//! on a [`ChangePipeline`](super::ChangePipeline). A blanket impl erases the
//! entity type so the pipeline can hold a plain ordered list.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::events::RoomEvent;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::room::{Entity, EntityKey, EntityKind, TrackedEntity};
use crate::ports::{EntityStore, RoomEventSink, WriteOutcome};

use super::Change;

/// State visible to pre-commit processors.
///
/// Writes are staged, not applied: they join the same commit as the changes
/// being processed.
pub struct PreCommitContext<'a> {
    store: &'a dyn EntityStore,
    pending: &'a [Change],
    staged: Vec<Entity>,
}

impl<'a> PreCommitContext<'a> {
    pub(crate) fn new(store: &'a dyn EntityStore, pending: &'a [Change]) -> Self {
        Self {
            store,
            pending,
            staged: Vec::new(),
        }
    }

    /// Value as it will be written by the commit, ignoring staged writes:
    /// the pending change if any, otherwise the committed row.
    pub async fn load<E: TrackedEntity>(&self, id: Uuid) -> Result<Option<E>, DomainError> {
        let key = EntityKey::of::<E>(id);
        if let Some(change) = self.pending.iter().find(|c| c.key() == key) {
            return Ok(E::from_entity(change.current()).cloned());
        }
        let entity = self.store.load(key).await?;
        Ok(entity.as_ref().and_then(E::from_entity).cloned())
    }

    /// Like [`load`](Self::load) but sees writes staged earlier in this
    /// phase.
    pub async fn current<E: TrackedEntity>(&self, id: Uuid) -> Result<Option<E>, DomainError> {
        let key = EntityKey::of::<E>(id);
        if let Some(staged) = self.staged.iter().rev().find(|e| e.key() == key) {
            return Ok(E::from_entity(staged).cloned());
        }
        self.load(id).await
    }

    /// Queue an additional write for this commit.
    pub fn stage<E: TrackedEntity>(&mut self, entity: E) {
        let entity = entity.into_entity();
        let key = entity.key();
        self.staged.retain(|e| e.key() != key);
        self.staged.push(entity);
    }

    pub(crate) fn into_staged(self) -> Vec<Entity> {
        self.staged
    }
}

/// State visible to post-commit processors.
pub struct PostCommitContext<'a> {
    store: &'a dyn EntityStore,
    sink: &'a dyn RoomEventSink,
    actor: Option<UserId>,
}

impl<'a> PostCommitContext<'a> {
    pub(crate) fn new(
        store: &'a dyn EntityStore,
        sink: &'a dyn RoomEventSink,
        actor: Option<UserId>,
    ) -> Self {
        Self { store, sink, actor }
    }

    /// Load a committed entity, e.g. an association the change does not carry.
    pub async fn load<E: TrackedEntity>(&self, id: Uuid) -> Result<Option<E>, DomainError> {
        let entity = self.store.load(EntityKey::of::<E>(id)).await?;
        Ok(entity.as_ref().and_then(E::from_entity).cloned())
    }

    /// Standalone write. It is not intercepted by the pipeline.
    pub async fn save<E: TrackedEntity>(&self, entity: E) -> Result<(), DomainError> {
        self.store.apply(&[entity.into_entity()]).await?;
        Ok(())
    }

    /// User whose action caused the commit, if known.
    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    /// Publish an event, attributing it to the commit's actor.
    pub async fn publish(&self, event: RoomEvent) -> WriteOutcome {
        let event = match self.actor {
            Some(actor) if event.created_by_id().is_none() => event.with_created_by(actor),
            _ => event,
        };
        self.sink.publish(event).await
    }
}

/// Runs before the write; may stage extra writes. Errors abort the commit.
#[async_trait]
pub trait PreCommitProcessor: Send + Sync {
    type Entity: TrackedEntity;

    fn name(&self) -> &'static str;

    async fn on_added(
        &self,
        _current: &Self::Entity,
        _ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn on_modified(
        &self,
        _original: &Self::Entity,
        _current: &Self::Entity,
        _ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Runs after the write; derives events. Errors are logged by the pipeline.
#[async_trait]
pub trait PostCommitProcessor: Send + Sync {
    type Entity: TrackedEntity;

    fn name(&self) -> &'static str;

    async fn on_added(
        &self,
        _current: &Self::Entity,
        _ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn on_modified(
        &self,
        _original: &Self::Entity,
        _current: &Self::Entity,
        _ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Entity-type-erased pre-commit processor.
#[async_trait]
pub(crate) trait DynPreCommit: Send + Sync {
    fn processor_name(&self) -> &'static str;
    fn kind(&self) -> EntityKind;
    async fn process(&self, change: &Change, ctx: &mut PreCommitContext<'_>)
        -> Result<(), DomainError>;
}

#[async_trait]
impl<P: PreCommitProcessor> DynPreCommit for P {
    fn processor_name(&self) -> &'static str {
        PreCommitProcessor::name(self)
    }

    fn kind(&self) -> EntityKind {
        P::Entity::KIND
    }

    async fn process(
        &self,
        change: &Change,
        ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        match change {
            Change::Added(current) => match P::Entity::from_entity(current) {
                Some(current) => PreCommitProcessor::on_added(self, current, ctx).await,
                None => Ok(()),
            },
            Change::Modified { original, current } => {
                match (P::Entity::from_entity(original), P::Entity::from_entity(current)) {
                    (Some(original), Some(current)) => {
                        PreCommitProcessor::on_modified(self, original, current, ctx).await
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Entity-type-erased post-commit processor.
#[async_trait]
pub(crate) trait DynPostCommit: Send + Sync {
    fn processor_name(&self) -> &'static str;
    fn kind(&self) -> EntityKind;
    async fn process(&self, change: &Change, ctx: &PostCommitContext<'_>) -> Result<(), DomainError>;
}

#[async_trait]
impl<P: PostCommitProcessor> DynPostCommit for P {
    fn processor_name(&self) -> &'static str {
        PostCommitProcessor::name(self)
    }

    fn kind(&self) -> EntityKind {
        P::Entity::KIND
    }

    async fn process(&self, change: &Change, ctx: &PostCommitContext<'_>) -> Result<(), DomainError> {
        match change {
            Change::Added(current) => match P::Entity::from_entity(current) {
                Some(current) => PostCommitProcessor::on_added(self, current, ctx).await,
                None => Ok(()),
            },
            Change::Modified { original, current } => {
                match (P::Entity::from_entity(original), P::Entity::from_entity(current)) {
                    (Some(original), Some(current)) => {
                        PostCommitProcessor::on_modified(self, original, current, ctx).await
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}
