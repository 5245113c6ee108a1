//! Code editor events.

use async_trait::async_trait;

use crate::domain::events::event_types;
use crate::domain::events::payloads::{CodeEditorChanged, CodeEditorEnabledChanged};
use crate::domain::events::RoomEvent;
use crate::domain::foundation::DomainError;
use crate::domain::room::RoomConfiguration;

use crate::application::change_tracking::{PostCommitContext, PostCommitProcessor};

/// Emits `ChangeCodeEditor` when the editor content changes and
/// `ChangeCodeEditorEnabledState` when the editor is enabled or disabled.
#[derive(Debug, Default)]
pub struct RoomConfigurationProcessor;

impl RoomConfigurationProcessor {
    async fn content_changed(
        &self,
        config: &RoomConfiguration,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        let event = RoomEvent::from_payload(
            config.room_id,
            event_types::CHANGE_CODE_EDITOR,
            &CodeEditorChanged {
                content: config.code_editor_content.clone(),
            },
            true,
        )?;
        ctx.publish(event).await;
        Ok(())
    }

    async fn enabled_changed(
        &self,
        config: &RoomConfiguration,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        let event = RoomEvent::from_payload(
            config.room_id,
            event_types::CHANGE_CODE_EDITOR_ENABLED_STATE,
            &CodeEditorEnabledChanged {
                enabled: config.code_editor_enabled,
            },
            true,
        )?;
        ctx.publish(event).await;
        Ok(())
    }
}

#[async_trait]
impl PostCommitProcessor for RoomConfigurationProcessor {
    type Entity = RoomConfiguration;

    fn name(&self) -> &'static str {
        "room_configuration"
    }

    async fn on_added(
        &self,
        current: &RoomConfiguration,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if current.code_editor_content.is_some() {
            self.content_changed(current, ctx).await?;
        }
        if current.code_editor_enabled {
            self.enabled_changed(current, ctx).await?;
        }
        Ok(())
    }

    async fn on_modified(
        &self,
        original: &RoomConfiguration,
        current: &RoomConfiguration,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if original.code_editor_content != current.code_editor_content {
            self.content_changed(current, ctx).await?;
        }
        if original.code_editor_enabled != current.code_editor_enabled {
            self.enabled_changed(current, ctx).await?;
        }
        Ok(())
    }
}
