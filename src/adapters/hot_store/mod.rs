//! Hot event store adapters.
//!
//! - `InMemoryHotEventStore` - process-local store
//! - `EmptyHotEventStore` - hot storage disabled
//! - `RedisHotEventStore` - shared Redis store

mod empty;
mod in_memory;
mod redis;

pub use empty::EmptyHotEventStore;
pub use in_memory::InMemoryHotEventStore;
pub use self::redis::RedisHotEventStore;
