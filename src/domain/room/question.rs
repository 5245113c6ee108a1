//! Questions attached to a room.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{QuestionId, RoomId, RoomQuestionId};

/// State of a question inside a room. At most one question per room is
/// `Active` at a time; that invariant is kept by the lifecycle service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomQuestionState {
    Open,
    Active,
    Closed,
}

/// A question from the question bank placed into a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomQuestion {
    pub id: RoomQuestionId,
    pub room_id: RoomId,
    pub question_id: QuestionId,
    pub state: RoomQuestionState,
    /// Initial code editor content when the question becomes active.
    pub code_editor_template: Option<String>,
    /// Editor content captured when the question stopped being active.
    pub code_snapshot: Option<String>,
}

impl RoomQuestion {
    pub fn new(room_id: RoomId, question_id: QuestionId) -> Self {
        Self {
            id: RoomQuestionId::new(),
            room_id,
            question_id,
            state: RoomQuestionState::Open,
            code_editor_template: None,
            code_snapshot: None,
        }
    }

    pub fn with_code_template(mut self, template: impl Into<String>) -> Self {
        self.code_editor_template = Some(template.into());
        self
    }

    pub fn with_state(mut self, state: RoomQuestionState) -> Self {
        self.state = state;
        self
    }

    pub fn is_active(&self) -> bool {
        self.state == RoomQuestionState::Active
    }
}
