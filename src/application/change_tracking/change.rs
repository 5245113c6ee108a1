//! Snapshot of one tracked entity's change in a commit.

use crate::domain::room::{Entity, EntityKey, EntityKind};

/// An added or modified entity, captured immediately before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(Entity),
    Modified { original: Entity, current: Entity },
}

impl Change {
    pub fn current(&self) -> &Entity {
        match self {
            Change::Added(current) => current,
            Change::Modified { current, .. } => current,
        }
    }

    pub fn original(&self) -> Option<&Entity> {
        match self {
            Change::Added(_) => None,
            Change::Modified { original, .. } => Some(original),
        }
    }

    pub fn key(&self) -> EntityKey {
        self.current().key()
    }

    pub fn kind(&self) -> EntityKind {
        self.current().kind()
    }

    pub fn is_added(&self) -> bool {
        matches!(self, Change::Added(_))
    }

    /// Replace the current value, keeping the change state and original.
    pub(crate) fn replace_current(&mut self, entity: Entity) {
        match self {
            Change::Added(current) => *current = entity,
            Change::Modified { current, .. } => *current = entity,
        }
    }
}
