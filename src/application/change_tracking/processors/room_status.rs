//! Room status events.

use async_trait::async_trait;

use crate::domain::events::event_types;
use crate::domain::events::payloads::{CodeEditorEnabledChanged, RoomStatusChanged};
use crate::domain::events::RoomEvent;
use crate::domain::foundation::DomainError;
use crate::domain::room::{Room, RoomConfiguration, RoomStatus};

use crate::application::change_tracking::{PostCommitContext, PostCommitProcessor};

/// Emits `ChangeRoomStatus` when a room's status changes. Closing a room
/// also locks its code editor.
#[derive(Debug, Default)]
pub struct RoomStatusProcessor;

#[async_trait]
impl PostCommitProcessor for RoomStatusProcessor {
    type Entity = Room;

    fn name(&self) -> &'static str {
        "room_status"
    }

    async fn on_modified(
        &self,
        original: &Room,
        current: &Room,
        ctx: &PostCommitContext<'_>,
    ) -> Result<(), DomainError> {
        if original.status == current.status {
            return Ok(());
        }

        let event = RoomEvent::from_payload(
            current.id,
            event_types::CHANGE_ROOM_STATUS,
            &RoomStatusChanged {
                previous: Some(original.status),
                current: current.status,
            },
            true,
        )?;
        ctx.publish(event).await;

        if current.status != RoomStatus::Close {
            return Ok(());
        }

        let Some(mut config) = ctx
            .load::<RoomConfiguration>(*current.id.as_uuid())
            .await?
        else {
            return Ok(());
        };
        if !config.code_editor_enabled {
            return Ok(());
        }
        config.code_editor_enabled = false;
        ctx.save(config).await?;

        let event = RoomEvent::from_payload(
            current.id,
            event_types::CHANGE_CODE_EDITOR_ENABLED_STATE,
            &CodeEditorEnabledChanged { enabled: false },
            true,
        )?;
        ctx.publish(event).await;
        Ok(())
    }
}
