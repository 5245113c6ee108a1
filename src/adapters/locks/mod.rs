//! Lock adapters.
//!
//! - `AsyncKeyedLock` - in-process exclusive section per key
//! - `InMemoryAdvisoryLock` / `RedisAdvisoryLock` - best-effort TTL markers

mod in_memory_advisory;
mod keyed;
mod redis_advisory;

pub use in_memory_advisory::InMemoryAdvisoryLock;
pub use keyed::{AsyncKeyedLock, KeyedLockGuard, LockError};
pub use redis_advisory::RedisAdvisoryLock;
