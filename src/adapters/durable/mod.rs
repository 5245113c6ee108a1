//! Durable event store adapters.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryDurableEventStore;
pub use postgres::PostgresDurableEventStore;
