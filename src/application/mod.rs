//! Application layer - orchestration over ports and adapters.
//!
//! - `change_tracking` - units of work and the change-interception pipeline
//! - `RoomEventDispatcher` - the event sink wired to bus, hot store and sockets
//! - `RoomStateReader` - latest room state for late joiners
//! - `RoomLifecycleService` - closing rooms and switching questions
//! - `live` - inbound socket message handling

pub mod change_tracking;
mod dispatcher;
mod lifecycle;
pub mod live;
mod state;

pub use dispatcher::RoomEventDispatcher;
pub use lifecycle::{RoomLifecycleService, DEFAULT_ADVISORY_TTL};
pub use state::{RoomStateReader, DEFAULT_STATE_SCAN_LIMIT};
