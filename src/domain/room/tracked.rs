//! Tracked entity envelope used by the unit of work.
//!
//! Every persisted kind that can produce room events is wrapped in
//! [`Entity`] so that change sets, stores and processors can handle a
//! heterogeneous list without reflection. [`TrackedEntity`] converts
//! between the typed struct and the envelope.

use std::fmt;

use uuid::Uuid;

use crate::domain::foundation::RoomId;

use super::{Room, RoomConfiguration, RoomQuestion, RoomQuestionEvaluation};

/// Discriminant of a tracked entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Room,
    RoomQuestion,
    RoomQuestionEvaluation,
    RoomConfiguration,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Room => "room",
            EntityKind::RoomQuestion => "room_question",
            EntityKind::RoomQuestionEvaluation => "room_question_evaluation",
            EntityKind::RoomConfiguration => "room_configuration",
        };
        write!(f, "{}", s)
    }
}

/// Identity of a tracked entity across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn of<E: TrackedEntity>(id: Uuid) -> Self {
        Self::new(E::KIND, id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A persisted value of any tracked kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Room(Room),
    RoomQuestion(RoomQuestion),
    RoomQuestionEvaluation(RoomQuestionEvaluation),
    RoomConfiguration(RoomConfiguration),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Room(_) => EntityKind::Room,
            Entity::RoomQuestion(_) => EntityKind::RoomQuestion,
            Entity::RoomQuestionEvaluation(_) => EntityKind::RoomQuestionEvaluation,
            Entity::RoomConfiguration(_) => EntityKind::RoomConfiguration,
        }
    }

    pub fn key(&self) -> EntityKey {
        let id = match self {
            Entity::Room(e) => e.entity_id(),
            Entity::RoomQuestion(e) => e.entity_id(),
            Entity::RoomQuestionEvaluation(e) => e.entity_id(),
            Entity::RoomConfiguration(e) => e.entity_id(),
        };
        EntityKey::new(self.kind(), id)
    }

    /// Room the entity belongs to, when it is known without a lookup.
    ///
    /// Evaluations only know their question, so they return `None`.
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Entity::Room(e) => Some(e.id),
            Entity::RoomQuestion(e) => Some(e.room_id),
            Entity::RoomQuestionEvaluation(_) => None,
            Entity::RoomConfiguration(e) => Some(e.room_id),
        }
    }
}

/// Conversion between a typed entity and the [`Entity`] envelope.
pub trait TrackedEntity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn entity_id(&self) -> Uuid;

    fn key(&self) -> EntityKey {
        EntityKey::new(Self::KIND, self.entity_id())
    }

    fn into_entity(self) -> Entity;

    fn from_entity(entity: &Entity) -> Option<&Self>;
}

impl TrackedEntity for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn entity_id(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn into_entity(self) -> Entity {
        Entity::Room(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Room(e) => Some(e),
            _ => None,
        }
    }
}

impl TrackedEntity for RoomQuestion {
    const KIND: EntityKind = EntityKind::RoomQuestion;

    fn entity_id(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn into_entity(self) -> Entity {
        Entity::RoomQuestion(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::RoomQuestion(e) => Some(e),
            _ => None,
        }
    }
}

impl TrackedEntity for RoomQuestionEvaluation {
    const KIND: EntityKind = EntityKind::RoomQuestionEvaluation;

    fn entity_id(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn into_entity(self) -> Entity {
        Entity::RoomQuestionEvaluation(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::RoomQuestionEvaluation(e) => Some(e),
            _ => None,
        }
    }
}

impl TrackedEntity for RoomConfiguration {
    const KIND: EntityKind = EntityKind::RoomConfiguration;

    /// Configurations share the id of their room.
    fn entity_id(&self) -> Uuid {
        *self.room_id.as_uuid()
    }

    fn into_entity(self) -> Entity {
        Entity::RoomConfiguration(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::RoomConfiguration(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::QuestionId;

    #[test]
    fn envelope_round_trips_typed_entity() {
        let question = RoomQuestion::new(RoomId::new(), QuestionId::new());
        let entity = question.clone().into_entity();

        assert_eq!(entity.kind(), EntityKind::RoomQuestion);
        assert_eq!(entity.key(), question.key());
        assert_eq!(RoomQuestion::from_entity(&entity), Some(&question));
        assert!(Room::from_entity(&entity).is_none());
    }

    #[test]
    fn configuration_is_keyed_by_room() {
        let room = Room::new("r");
        let config = RoomConfiguration::new(room.id);

        assert_eq!(config.key().id, room.key().id);
        assert_ne!(config.key(), room.key());
        assert_eq!(config.into_entity().room_id(), Some(room.id));
    }

    #[test]
    fn evaluation_has_no_direct_room() {
        let eval = RoomQuestionEvaluation::new(
            crate::domain::foundation::RoomQuestionId::new(),
            crate::domain::foundation::UserId::new(),
        );
        assert!(eval.into_entity().room_id().is_none());
    }
}
