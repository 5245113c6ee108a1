//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Event Storage Ports
//!
//! - `HotEventStore` - Staging area for recent events, queried by spec
//! - `DurableEventStore` - Permanent archive written by the drain service
//!
//! ## Delivery Ports
//!
//! - `RoomEventSink` - Where producers hand over derived events
//! - `ConnectionRegistry` - Live connections per room
//! - `TransportConnection` - One live client endpoint
//!
//! ## Persistence and Coordination Ports
//!
//! - `EntityStore` - Tracked room entities
//! - `AdvisoryLock` - Best-effort cross-process markers

mod advisory_lock;
mod connection_registry;
mod durable_event_store;
mod entity_store;
mod hot_event_store;
mod room_event_sink;
mod transport;

pub use advisory_lock::{AdvisoryLock, AdvisoryLockError};
pub use connection_registry::{ConnectionRegistration, ConnectionRegistry};
pub use durable_event_store::{DurableEventStore, DurableStoreError};
pub use entity_store::{load_typed, EntityStore, EntityStoreError};
pub use hot_event_store::{HotEventStore, HotStoreError};
pub use room_event_sink::{ConnectionFilter, RoomEventSink, WriteOutcome};
pub use transport::{DeliveryReport, TransportConnection, TransportError};
