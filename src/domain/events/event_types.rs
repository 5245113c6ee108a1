//! Event type tags carried in `RoomEvent::event_type`.
//!
//! Tags are plain strings on the wire; these constants are the ones the
//! server itself produces.

/// A chat message posted by a participant.
pub const CHAT_MESSAGE: &str = "ChatMessage";

/// A reaction (like, dislike, ...) sent by a participant.
pub const REACTION: &str = "Reaction";

/// The room moved to another status.
pub const CHANGE_ROOM_STATUS: &str = "ChangeRoomStatus";

/// A question was attached to the room.
pub const ADD_ROOM_QUESTION: &str = "AddRoomQuestion";

/// A room question changed state (open, active, closed).
pub const CHANGE_ROOM_QUESTION_STATE: &str = "ChangeRoomQuestionState";

/// An expert's evaluation of a room question changed.
pub const CHANGE_ROOM_QUESTION_EVALUATION: &str = "ChangeRoomQuestionEvaluation";

/// The shared code editor content changed.
pub const CHANGE_CODE_EDITOR: &str = "ChangeCodeEditor";

/// The shared code editor was enabled or disabled.
pub const CHANGE_CODE_EDITOR_ENABLED_STATE: &str = "ChangeCodeEditorEnabledState";

/// A WebRTC signal addressed to one participant.
pub const SENDING_SIGNAL: &str = "SendingSignal";
