//! Room event bus and drain adapters.
//!
//! - `EventChannel` - bounded drop-oldest queue of one room
//! - `RoomEventBus` - room id to channel map shared by producers and consumers
//! - `EventDrainService` - background migration from hot to durable storage

mod channel;
mod drain_service;
mod room_event_bus;

pub use channel::{EventChannel, DEFAULT_CHANNEL_CAPACITY};
pub use drain_service::{DrainConfig, DrainReport, EventDrainService};
pub use room_event_bus::RoomEventBus;
