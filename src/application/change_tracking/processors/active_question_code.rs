//! Keeps the shared code editor in step with the active question.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::room::{RoomConfiguration, RoomQuestion};

use crate::application::change_tracking::{PreCommitContext, PreCommitProcessor};

/// Pre-commit processor for room questions.
///
/// - A question leaving `Active` gets the editor content as of this commit
///   saved into its `code_snapshot`.
/// - A question becoming `Active` loads its snapshot (or its template) into
///   the room configuration and enables the editor.
///
/// Both writes land in the same commit as the state change.
#[derive(Debug, Default)]
pub struct ActiveQuestionCodeProcessor;

impl ActiveQuestionCodeProcessor {
    async fn activate(
        &self,
        question: &RoomQuestion,
        ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        let mut config = ctx
            .current::<RoomConfiguration>(*question.room_id.as_uuid())
            .await?
            .unwrap_or_else(|| RoomConfiguration::new(question.room_id));
        config.code_editor_content = question
            .code_snapshot
            .clone()
            .or_else(|| question.code_editor_template.clone());
        config.code_editor_enabled = true;
        config.active_question_id = Some(question.id);
        ctx.stage(config);
        Ok(())
    }

    async fn snapshot(
        &self,
        question: &RoomQuestion,
        ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        let content = ctx
            .load::<RoomConfiguration>(*question.room_id.as_uuid())
            .await?
            .and_then(|config| config.code_editor_content);
        if let Some(content) = content {
            let mut question = question.clone();
            question.code_snapshot = Some(content);
            ctx.stage(question);
        }
        Ok(())
    }
}

#[async_trait]
impl PreCommitProcessor for ActiveQuestionCodeProcessor {
    type Entity = RoomQuestion;

    fn name(&self) -> &'static str {
        "active_question_code"
    }

    async fn on_added(
        &self,
        current: &RoomQuestion,
        ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if current.is_active() {
            self.activate(current, ctx).await?;
        }
        Ok(())
    }

    async fn on_modified(
        &self,
        original: &RoomQuestion,
        current: &RoomQuestion,
        ctx: &mut PreCommitContext<'_>,
    ) -> Result<(), DomainError> {
        match (original.is_active(), current.is_active()) {
            (true, false) => self.snapshot(current, ctx).await,
            (false, true) => self.activate(current, ctx).await,
            _ => Ok(()),
        }
    }
}
