//! Per-room shared editor configuration.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RoomId, RoomQuestionId};

/// Live configuration of a room: the shared code editor and the active
/// question. There is exactly one per room, keyed by the room id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfiguration {
    pub room_id: RoomId,
    pub code_editor_content: Option<String>,
    pub code_editor_enabled: bool,
    pub active_question_id: Option<RoomQuestionId>,
}

impl RoomConfiguration {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            code_editor_content: None,
            code_editor_enabled: false,
            active_question_id: None,
        }
    }
}
