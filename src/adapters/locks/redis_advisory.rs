//! Redis advisory lock.
//!
//! `try_acquire` checks for the marker and then writes it with `SET .. EX`.
//! The two commands are deliberately separate: this is a hint shared
//! between cooperating servers, and two of them may both win the race.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::{AdvisoryLock, AdvisoryLockError};

const KEY_PREFIX: &str = "advisory-lock";

#[derive(Clone)]
pub struct RedisAdvisoryLock {
    conn: MultiplexedConnection,
}

impl RedisAdvisoryLock {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn marker_key(key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }
}

fn unavailable(e: redis::RedisError) -> AdvisoryLockError {
    AdvisoryLockError::Unavailable(e.to_string())
}

#[async_trait]
impl AdvisoryLock for RedisAdvisoryLock {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, AdvisoryLockError> {
        let marker = Self::marker_key(key);
        let mut conn = self.conn.clone();

        let exists: bool = conn.exists(&marker).await.map_err(unavailable)?;
        if exists {
            return Ok(false);
        }

        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(&marker, 1, ttl_secs)
            .await
            .map_err(unavailable)?;
        Ok(true)
    }

    async fn is_held(&self, key: &str) -> Result<bool, AdvisoryLockError> {
        let mut conn = self.conn.clone();
        conn.exists(Self::marker_key(key)).await.map_err(unavailable)
    }

    async fn release(&self, key: &str) -> Result<(), AdvisoryLockError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::marker_key(key))
            .await
            .map_err(unavailable)
    }
}

impl std::fmt::Debug for RedisAdvisoryLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisAdvisoryLock").finish_non_exhaustive()
    }
}
