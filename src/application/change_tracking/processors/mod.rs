//! Concrete change processors.
//!
//! | Processor | Phase | Entity | Emits |
//! |-----------|-------|--------|-------|
//! | `ActiveQuestionCodeProcessor` | pre | RoomQuestion | (stages editor writes) |
//! | `RoomStatusProcessor` | post | Room | ChangeRoomStatus, ChangeCodeEditorEnabledState |
//! | `RoomQuestionProcessor` | post | RoomQuestion | AddRoomQuestion, ChangeRoomQuestionState |
//! | `RoomConfigurationProcessor` | post | RoomConfiguration | ChangeCodeEditor, ChangeCodeEditorEnabledState |
//! | `QuestionEvaluationProcessor` | post | RoomQuestionEvaluation | ChangeRoomQuestionEvaluation |

mod active_question_code;
mod question_evaluation;
mod room_configuration;
mod room_question;
mod room_status;

pub use active_question_code::ActiveQuestionCodeProcessor;
pub use question_evaluation::QuestionEvaluationProcessor;
pub use room_configuration::RoomConfigurationProcessor;
pub use room_question::RoomQuestionProcessor;
pub use room_status::RoomStatusProcessor;

use std::sync::Arc;

use crate::ports::RoomEventSink;

use super::ChangePipeline;

/// Pipeline with every room processor registered in its standard order.
pub fn room_pipeline(sink: Arc<dyn RoomEventSink>) -> ChangePipeline {
    ChangePipeline::new(sink)
        .with_pre_commit(ActiveQuestionCodeProcessor)
        .with_post_commit(RoomStatusProcessor)
        .with_post_commit(RoomQuestionProcessor)
        .with_post_commit(RoomConfigurationProcessor)
        .with_post_commit(QuestionEvaluationProcessor)
}
