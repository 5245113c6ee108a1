//! Typed payloads for the events the server produces.
//!
//! Payloads are serialized into `RoomEvent::payload` with camelCase keys,
//! which is what browser clients read.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{QuestionId, RoomQuestionId, UserId};
use crate::domain::room::{RoomQuestionState, RoomStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub reaction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusChanged {
    pub previous: Option<RoomStatus>,
    pub current: RoomStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuestionAdded {
    pub room_question_id: RoomQuestionId,
    pub question_id: QuestionId,
    pub state: RoomQuestionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuestionStateChanged {
    pub room_question_id: RoomQuestionId,
    pub question_id: QuestionId,
    pub old_state: RoomQuestionState,
    pub new_state: RoomQuestionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationChanged {
    pub room_question_id: RoomQuestionId,
    pub user_id: UserId,
    pub review: Option<String>,
    pub mark: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEditorChanged {
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEditorEnabledChanged {
    pub enabled: bool,
}

/// WebRTC signalling data relayed to exactly one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingSignal {
    pub to: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<UserId>,
    pub signal: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_change_uses_camel_case_keys() {
        let payload = RoomQuestionStateChanged {
            room_question_id: RoomQuestionId::new(),
            question_id: QuestionId::new(),
            old_state: RoomQuestionState::Open,
            new_state: RoomQuestionState::Active,
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["oldState"], json!("Open"));
        assert_eq!(value["newState"], json!("Active"));
        assert!(value.get("roomQuestionId").is_some());
    }

    #[test]
    fn chat_message_omits_missing_nickname() {
        let value = serde_json::to_value(ChatMessagePayload {
            message: "hello".into(),
            nickname: None,
        })
        .unwrap();
        assert_eq!(value, json!({"message": "hello"}));
    }
}
