//! Domain layer containing the room event model.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors)
//! - `room` - Persisted room entities tracked by the change pipeline
//! - `events` - Room events, query specs and durable projections

pub mod events;
pub mod foundation;
pub mod room;
