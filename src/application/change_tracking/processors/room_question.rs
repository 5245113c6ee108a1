//! Room question events.

use async_trait::async_trait;

use crate::domain::events::event_types;
use crate::domain::events::payloads::{RoomQuestionAdded, RoomQuestionStateChanged};
use crate::domain::events::RoomEvent;
use crate::domain::foundation::DomainError;
use crate::domain::room::RoomQuestion;

use crate::application::change_tracking::{PostCommitContext, PostCommitProcessor};

/// Emits `AddRoomQuestion` for new questions and `ChangeRoomQuestionState`
/// when a question's state changes.
#[derive(Debug, Default)]
pub struct RoomQuestionProcessor;

#[async_trait]
impl PostCommitProcessor for RoomQuestionProcessor {
    type Entity = RoomQuestion;

    fn name(&self) -> &'static str {
        "room_question"
    }

    async fn on_added(
        &self,
        current: &RoomQuestion,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        let event = RoomEvent::from_payload(
            current.room_id,
            event_types::ADD_ROOM_QUESTION,
            &RoomQuestionAdded {
                room_question_id: current.id,
                question_id: current.question_id,
                state: current.state,
            },
            false,
        )?;
        ctx.publish(event).await;
        Ok(())
    }

    async fn on_modified(
        &self,
        original: &RoomQuestion,
        current: &RoomQuestion,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if original.state == current.state {
            return Ok(());
        }
        let event = RoomEvent::from_payload(
            current.room_id,
            event_types::CHANGE_ROOM_QUESTION_STATE,
            &RoomQuestionStateChanged {
                room_question_id: current.id,
                question_id: current.question_id,
                old_state: original.state,
                new_state: current.state,
            },
            true,
        )?;
        ctx.publish(event).await;
        Ok(())
    }
}
