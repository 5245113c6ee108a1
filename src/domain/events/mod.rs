//! Room events - the unit that flows through the event pipeline.
//!
//! - `RoomEvent` - immutable event value produced inside a room
//! - `EventSpec` - room-scoped filter used to query hot storage
//! - `DurableEvent` / `QueuedRoomEvent` - cold-storage projection and drain marker
//! - `event_types` - tags produced by the server
//! - `payloads` - typed payload bodies for those tags

mod durable;
pub mod event_types;
pub mod payloads;
mod room_event;
mod spec;

pub use durable::{DurableEvent, QueuedRoomEvent};
pub use room_event::RoomEvent;
pub use spec::EventSpec;
