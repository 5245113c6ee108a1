//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types that form the
//! vocabulary of the interview room domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{ConnectionId, EvaluationId, EventId, QuestionId, RoomId, RoomQuestionId, UserId};
pub use timestamp::Timestamp;
