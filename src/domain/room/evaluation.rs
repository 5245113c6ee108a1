//! Expert evaluations of room questions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EvaluationId, RoomQuestionId, UserId};

/// One expert's review and mark for one room question.
///
/// The evaluation references its question only by id; the owning room is
/// reached through the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomQuestionEvaluation {
    pub id: EvaluationId,
    pub room_question_id: RoomQuestionId,
    pub user_id: UserId,
    pub review: Option<String>,
    pub mark: Option<i32>,
}

impl RoomQuestionEvaluation {
    pub fn new(room_question_id: RoomQuestionId, user_id: UserId) -> Self {
        Self {
            id: EvaluationId::new(),
            room_question_id,
            user_id,
            review: None,
            mark: None,
        }
    }
}
