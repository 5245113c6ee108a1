//! Room-side persisted entities that the change pipeline tracks.
//!
//! - `Room` / `RoomStatus` - the room itself
//! - `RoomQuestion` / `RoomQuestionState` - questions placed into a room
//! - `RoomQuestionEvaluation` - expert review of a question
//! - `RoomConfiguration` - shared code editor and active question
//! - `Entity` / `TrackedEntity` - envelope used by the unit of work

mod configuration;
mod evaluation;
mod participant;
mod question;
#[allow(clippy::module_inception)]
mod room;
mod tracked;

pub use configuration::RoomConfiguration;
pub use evaluation::RoomQuestionEvaluation;
pub use participant::ParticipantType;
pub use question::{RoomQuestion, RoomQuestionState};
pub use room::{Room, RoomStatus};
pub use tracked::{Entity, EntityKey, EntityKind, TrackedEntity};
