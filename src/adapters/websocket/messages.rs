//! Wire format of the live room socket.
//!
//! - Server → Client: every room event, as an [`OutboundEvent`]
//! - Client → Server: `{ "type": ..., "value": ... }`, see `InboundMessage`

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::events::RoomEvent;
use crate::domain::foundation::{EventId, Timestamp, UserId};

/// A room event as browsers receive it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEvent<'a> {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub value: &'a JsonValue,
    pub stateful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<UserId>,
    pub created_at: Timestamp,
}

impl<'a> From<&'a RoomEvent> for OutboundEvent<'a> {
    fn from(event: &'a RoomEvent) -> Self {
        Self {
            id: event.id(),
            event_type: event.event_type(),
            value: event.payload(),
            stateful: event.stateful(),
            created_by_id: event.created_by_id(),
            created_at: event.created_at(),
        }
    }
}

/// Error frame sent back when an inbound message is rejected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub code: String,
    pub message: String,
}

impl ErrorFrame {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            frame_type: "Error",
            code: code.into(),
            message: message.into(),
        }
    }
}
