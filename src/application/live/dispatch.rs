//! Routing of inbound socket messages to handlers by message type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::domain::foundation::{ConnectionId, DomainError, RoomId, UserId};
use crate::domain::room::ParticipantType;

/// A message sent by a client: `{ "type": "chat-message", "value": ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type", alias = "Type")]
    pub message_type: String,
    #[serde(default, alias = "Value")]
    pub value: JsonValue,
}

impl InboundMessage {
    pub fn new(message_type: impl Into<String>, value: JsonValue) -> Self {
        Self {
            message_type: message_type.into(),
            value,
        }
    }
}

/// Who sent an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSession {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub participant_type: ParticipantType,
    pub connection_id: ConnectionId,
}

/// Handles one inbound message type.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// The `type` this handler answers to.
    fn message_type(&self) -> &'static str;

    async fn handle(&self, session: &LiveSession, value: JsonValue) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// No handler is registered for the message type.
    Ignored,
}

/// Maps message types to handlers.
#[derive(Default)]
pub struct MessageDispatcher {
    handlers: HashMap<&'static str, Arc<dyn InboundHandler>>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A later handler for the same type replaces the
    /// earlier one.
    pub fn with_handler<H: InboundHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.insert(handler.message_type(), Arc::new(handler));
        self
    }

    pub fn message_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub async fn dispatch(
        &self,
        session: &LiveSession,
        message: InboundMessage,
    ) -> Result<DispatchOutcome, DomainError> {
        let Some(handler) = self.handlers.get(message.message_type.as_str()) else {
            tracing::trace!(
                room_id = %session.room_id,
                message_type = %message.message_type,
                "No handler for inbound message"
            );
            return Ok(DispatchOutcome::Ignored);
        };

        handler.handle(session, message.value).await?;
        Ok(DispatchOutcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<JsonValue>>,
    }

    struct RecordingHandler(Arc<Recorder>);

    #[async_trait]
    impl InboundHandler for RecordingHandler {
        fn message_type(&self) -> &'static str {
            "ping"
        }

        async fn handle(&self, _session: &LiveSession, value: JsonValue) -> Result<(), DomainError> {
            self.0.seen.lock().push(value);
            Ok(())
        }
    }

    fn session() -> LiveSession {
        LiveSession {
            room_id: RoomId::new(),
            user_id: UserId::new(),
            participant_type: ParticipantType::Viewer,
            connection_id: ConnectionId::new(),
        }
    }

    #[test]
    fn inbound_message_accepts_both_casings() {
        let lower: InboundMessage =
            serde_json::from_str(r#"{"type":"chat-message","value":"hi"}"#).unwrap();
        let pascal: InboundMessage =
            serde_json::from_str(r#"{"Type":"chat-message","Value":"hi"}"#).unwrap();

        assert_eq!(lower, pascal);
        assert_eq!(lower.value, json!("hi"));
    }

    #[test]
    fn missing_value_is_null() {
        let message: InboundMessage = serde_json::from_str(r#"{"type":"x"}"#).unwrap();

        assert!(message.value.is_null());
    }

    #[tokio::test]
    async fn dispatch_routes_by_type() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = MessageDispatcher::new().with_handler(RecordingHandler(recorder.clone()));

        let outcome = dispatcher
            .dispatch(&session(), InboundMessage::new("ping", json!(1)))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(*recorder.seen.lock(), vec![json!(1)]);
    }

    #[tokio::test]
    async fn unknown_type_is_ignored() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = MessageDispatcher::new().with_handler(RecordingHandler(recorder.clone()));

        let outcome = dispatcher
            .dispatch(&session(), InboundMessage::new("pong", json!(1)))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(recorder.seen.lock().is_empty());
    }
}
