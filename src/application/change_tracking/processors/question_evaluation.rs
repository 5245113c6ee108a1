//! Evaluation events.

use async_trait::async_trait;

use crate::domain::events::event_types;
use crate::domain::events::payloads::EvaluationChanged;
use crate::domain::events::RoomEvent;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::room::{RoomQuestion, RoomQuestionEvaluation};

use crate::application::change_tracking::{PostCommitContext, PostCommitProcessor};

/// Emits `ChangeRoomQuestionEvaluation` when an expert's review or mark
/// changes.
///
/// Evaluations only reference their question, so the owning room is
/// resolved by loading the question.
#[derive(Debug, Default)]
pub struct QuestionEvaluationProcessor;

impl QuestionEvaluationProcessor {
    async fn emit(
        &self,
        evaluation: &RoomQuestionEvaluation,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        let question: RoomQuestion = ctx
            .load(*evaluation.room_question_id.as_uuid())
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::RoomQuestionNotFound,
                    "Evaluated room question does not exist",
                )
                .with_detail("room_question_id", evaluation.room_question_id.to_string())
            })?;

        let event = RoomEvent::from_payload(
            question.room_id,
            event_types::CHANGE_ROOM_QUESTION_EVALUATION,
            &EvaluationChanged {
                room_question_id: evaluation.room_question_id,
                user_id: evaluation.user_id,
                review: evaluation.review.clone(),
                mark: evaluation.mark,
            },
            false,
        )?
        .with_created_by(evaluation.user_id);
        ctx.publish(event).await;
        Ok(())
    }
}

#[async_trait]
impl PostCommitProcessor for QuestionEvaluationProcessor {
    type Entity = RoomQuestionEvaluation;

    fn name(&self) -> &'static str {
        "question_evaluation"
    }

    async fn on_added(
        &self,
        current: &RoomQuestionEvaluation,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if current.review.is_some() || current.mark.is_some() {
            self.emit(current, ctx).await?;
        }
        Ok(())
    }

    async fn on_modified(
        &self,
        original: &RoomQuestionEvaluation,
        current: &RoomQuestionEvaluation,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if original.review != current.review || original.mark != current.mark {
            self.emit(current, ctx).await?;
        }
        Ok(())
    }
}
