//! ChangePipeline - runs registered processors around an entity commit.
//!
//! ```text
//!   changes ──► pre-commit processors ──► merge staged writes
//!                   │ (error aborts)              │
//!                   ▼                             ▼
//!               Err(..)                 EntityStore::apply
//!                                                 │
//!                                                 ▼
//!                                   post-commit processors ──► events
//!                                   (errors logged, isolated)
//! ```

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::room::Entity;
use crate::ports::{EntityStore, RoomEventSink};

use super::processor::{DynPostCommit, DynPreCommit, PostCommitContext, PreCommitContext};
use super::{Change, PostCommitProcessor, PreCommitProcessor};

/// Result of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub added: usize,
    pub modified: usize,
    /// Post-commit processor invocations that failed and were logged.
    pub post_commit_failures: usize,
}

/// Ordered pre-commit and post-commit processors.
///
/// Processors run in registration order; each processor sees every change
/// of its entity kind in tracking order.
pub struct ChangePipeline {
    sink: Arc<dyn RoomEventSink>,
    pre_commit: Vec<Arc<dyn DynPreCommit>>,
    post_commit: Vec<Arc<dyn DynPostCommit>>,
}

impl ChangePipeline {
    pub fn new(sink: Arc<dyn RoomEventSink>) -> Self {
        Self {
            sink,
            pre_commit: Vec::new(),
            post_commit: Vec::new(),
        }
    }

    pub fn with_pre_commit<P>(mut self, processor: P) -> Self
    where
        P: PreCommitProcessor + 'static,
    {
        self.pre_commit.push(Arc::new(processor));
        self
    }

    pub fn with_post_commit<P>(mut self, processor: P) -> Self
    where
        P: PostCommitProcessor + 'static,
    {
        self.post_commit.push(Arc::new(processor));
        self
    }

    /// Names of registered processors, pre-commit first.
    pub fn processor_names(&self) -> Vec<&'static str> {
        self.pre_commit
            .iter()
            .map(|p| p.processor_name())
            .chain(self.post_commit.iter().map(|p| p.processor_name()))
            .collect()
    }

    /// Commit a change set.
    ///
    /// Returns the first pre-commit error, or the store's error, without
    /// having written anything. Post-commit failures never fail the commit.
    pub async fn commit(
        &self,
        store: &dyn EntityStore,
        changes: Vec<Change>,
        actor: Option<UserId>,
    ) -> Result<CommitSummary, DomainError> {
        if changes.is_empty() {
            return Ok(CommitSummary::default());
        }

        let staged = self.run_pre_commit(store, &changes).await?;
        let changes = merge_staged(store, changes, staged).await?;

        let writes: Vec<Entity> = changes.iter().map(|c| c.current().clone()).collect();
        store.apply(&writes).await?;

        let mut summary = CommitSummary {
            added: changes.iter().filter(|c| c.is_added()).count(),
            modified: changes.iter().filter(|c| !c.is_added()).count(),
            post_commit_failures: 0,
        };
        summary.post_commit_failures = self.run_post_commit(store, &changes, actor).await;

        tracing::debug!(
            added = summary.added,
            modified = summary.modified,
            post_commit_failures = summary.post_commit_failures,
            "Committed tracked changes"
        );
        Ok(summary)
    }

    async fn run_pre_commit(
        &self,
        store: &dyn EntityStore,
        changes: &[Change],
    ) -> Result<Vec<Entity>, DomainError> {
        let mut ctx = PreCommitContext::new(store, changes);
        for processor in &self.pre_commit {
            for change in changes.iter().filter(|c| c.kind() == processor.kind()) {
                processor.process(change, &mut ctx).await.map_err(|e| {
                    tracing::warn!(
                        processor = processor.processor_name(),
                        entity = %change.key(),
                        error = %e,
                        "Pre-commit processor failed, aborting commit"
                    );
                    e
                })?;
            }
        }
        Ok(ctx.into_staged())
    }

    async fn run_post_commit(
        &self,
        store: &dyn EntityStore,
        changes: &[Change],
        actor: Option<UserId>,
    ) -> usize {
        let ctx = PostCommitContext::new(store, self.sink.as_ref(), actor);
        let mut failures = 0;
        for processor in &self.post_commit {
            for change in changes.iter().filter(|c| c.kind() == processor.kind()) {
                if let Err(e) = processor.process(change, &ctx).await {
                    failures += 1;
                    tracing::warn!(
                        processor = processor.processor_name(),
                        entity_kind = %change.kind(),
                        entity = %change.key(),
                        error = %e,
                        "Post-commit processor failed"
                    );
                }
            }
        }
        failures
    }
}

/// Fold staged writes into the change set.
///
/// A staged entity already in the set replaces its current value. Otherwise
/// it is compared with the committed row: absent means added, different
/// means modified, identical is dropped.
async fn merge_staged(
    store: &dyn EntityStore,
    mut changes: Vec<Change>,
    staged: Vec<Entity>,
) -> Result<Vec<Change>, DomainError> {
    for entity in staged {
        let key = entity.key();
        if let Some(existing) = changes.iter_mut().find(|c| c.key() == key) {
            existing.replace_current(entity);
            continue;
        }
        match store.load(key).await? {
            Some(original) if original == entity => {}
            Some(original) => changes.push(Change::Modified {
                original,
                current: entity,
            }),
            None => changes.push(Change::Added(entity)),
        }
    }
    Ok(changes)
}
