//! Handlers for messages participants send over the live socket.
//!
//! Chat messages and reactions are broadcast-only events published
//! straight to the sink. Code editor edits mutate `RoomConfiguration`
//! through a unit of work, so the editor event is derived by the change
//! pipeline like any other entity change. Video signals go to one user only.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::adapters::websocket::filters;
use crate::application::change_tracking::UnitOfWorkFactory;
use crate::domain::events::payloads::{ChatMessagePayload, ReactionPayload, SendingSignal};
use crate::domain::events::{event_types, RoomEvent};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::room::{ParticipantType, RoomConfiguration};
use crate::ports::RoomEventSink;

use super::{InboundHandler, LiveSession};

pub const CHAT_MESSAGE: &str = "chat-message";
pub const REACTION: &str = "reaction";
pub const CODE: &str = "code";
pub const SENDING_SIGNAL: &str = "sending-signal";

/// Accepts either a bare string or the full payload object.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOr<T> {
    Text(String),
    Full(T),
}

fn parse<T: for<'de> Deserialize<'de>>(field: &str, value: JsonValue) -> Result<T, DomainError> {
    serde_json::from_value(value).map_err(|e| DomainError::validation(field, e.to_string()))
}

fn require_text(field: &str, text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::validation(field, format!("{} must not be empty", field)));
    }
    Ok(())
}

pub struct ChatMessageHandler {
    sink: Arc<dyn RoomEventSink>,
}

impl ChatMessageHandler {
    pub fn new(sink: Arc<dyn RoomEventSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl InboundHandler for ChatMessageHandler {
    fn message_type(&self) -> &'static str {
        CHAT_MESSAGE
    }

    async fn handle(&self, session: &LiveSession, value: JsonValue) -> Result<(), DomainError> {
        let payload = match parse::<TextOr<ChatMessagePayload>>("message", value)? {
            TextOr::Text(message) => ChatMessagePayload {
                message,
                nickname: None,
            },
            TextOr::Full(payload) => payload,
        };
        require_text("message", &payload.message)?;

        let event =
            RoomEvent::from_payload(session.room_id, event_types::CHAT_MESSAGE, &payload, false)?
                .with_created_by(session.user_id);
        self.sink.publish(event).await;
        Ok(())
    }
}

pub struct ReactionHandler {
    sink: Arc<dyn RoomEventSink>,
}

impl ReactionHandler {
    pub fn new(sink: Arc<dyn RoomEventSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl InboundHandler for ReactionHandler {
    fn message_type(&self) -> &'static str {
        REACTION
    }

    async fn handle(&self, session: &LiveSession, value: JsonValue) -> Result<(), DomainError> {
        let payload = match parse::<TextOr<ReactionPayload>>("reaction", value)? {
            TextOr::Text(reaction) => ReactionPayload {
                reaction,
                target: None,
            },
            TextOr::Full(payload) => payload,
        };
        require_text("reaction", &payload.reaction)?;

        let event = RoomEvent::from_payload(session.room_id, event_types::REACTION, &payload, false)?
            .with_created_by(session.user_id);
        self.sink.publish(event).await;
        Ok(())
    }
}

#[derive(Deserialize)]
struct CodeEdit {
    content: String,
}

/// Writes the shared editor content.
///
/// Viewers cannot edit. Examinees can edit only while the editor is
/// enabled; experts always can.
pub struct CodeEditorHandler {
    units: UnitOfWorkFactory,
}

impl CodeEditorHandler {
    pub fn new(units: UnitOfWorkFactory) -> Self {
        Self { units }
    }
}

#[async_trait]
impl InboundHandler for CodeEditorHandler {
    fn message_type(&self) -> &'static str {
        CODE
    }

    async fn handle(&self, session: &LiveSession, value: JsonValue) -> Result<(), DomainError> {
        let content = match parse::<TextOr<CodeEdit>>("content", value)? {
            TextOr::Text(content) => content,
            TextOr::Full(edit) => edit.content,
        };
        if session.participant_type == ParticipantType::Viewer {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Viewers cannot edit code",
            ));
        }

        let mut uow = self.units.begin().with_actor(session.user_id);
        let mut config = uow
            .load::<RoomConfiguration>(*session.room_id.as_uuid())
            .await?
            .unwrap_or_else(|| RoomConfiguration::new(session.room_id));

        if !config.code_editor_enabled && session.participant_type != ParticipantType::Expert {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Code editor is disabled",
            ));
        }
        if config.code_editor_content.as_deref() == Some(content.as_str()) {
            return Ok(());
        }

        config.code_editor_content = Some(content);
        uow.update(config).await?;
        uow.commit().await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct SignalRequest {
    to: UserId,
    #[serde(default)]
    signal: JsonValue,
}

/// Relays WebRTC signalling to the addressed user's connections.
pub struct VideoSignalHandler {
    sink: Arc<dyn RoomEventSink>,
}

impl VideoSignalHandler {
    pub fn new(sink: Arc<dyn RoomEventSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl InboundHandler for VideoSignalHandler {
    fn message_type(&self) -> &'static str {
        SENDING_SIGNAL
    }

    async fn handle(&self, session: &LiveSession, value: JsonValue) -> Result<(), DomainError> {
        let request: SignalRequest = parse("to", value)?;
        let payload = SendingSignal {
            to: request.to,
            from: Some(session.user_id),
            signal: request.signal,
        };
        let event =
            RoomEvent::from_payload(session.room_id, event_types::SENDING_SIGNAL, &payload, false)?
                .with_created_by(session.user_id);

        let report = self
            .sink
            .deliver_to(event, &filters::user(request.to))
            .await;
        if report.delivered == 0 {
            tracing::debug!(
                room_id = %session.room_id,
                to = %request.to,
                "Signal target has no live connection"
            );
        }
        Ok(())
    }
}
