//! Adapters - Implementations of port interfaces.
//!
//! - `events` - room event bus and the hot-to-durable drain
//! - `hot_store` - hot event storage (in-memory, Redis, disabled)
//! - `durable` - durable event storage (in-memory, PostgreSQL)
//! - `entities` - room entity storage
//! - `locks` - keyed and advisory locks
//! - `websocket` - connection registry, fan-out and the live endpoint

pub mod durable;
pub mod entities;
pub mod events;
pub mod hot_store;
pub mod locks;
pub mod websocket;
