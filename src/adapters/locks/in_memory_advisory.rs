//! In-memory advisory lock with TTL expiry, for tests and single-node runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::ports::{AdvisoryLock, AdvisoryLockError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAdvisoryLock {
    markers: Arc<Mutex<HashMap<String, Instant>>>,
}

impl InMemoryAdvisoryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdvisoryLock for InMemoryAdvisoryLock {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, AdvisoryLockError> {
        let now = Instant::now();
        let mut markers = self.markers.lock();
        if let Some(expires_at) = markers.get(key) {
            if *expires_at > now {
                return Ok(false);
            }
        }
        markers.insert(key.to_string(), now + ttl);
        Ok(true)
    }

    async fn is_held(&self, key: &str) -> Result<bool, AdvisoryLockError> {
        let now = Instant::now();
        Ok(self
            .markers
            .lock()
            .get(key)
            .map(|expires_at| *expires_at > now)
            .unwrap_or(false))
    }

    async fn release(&self, key: &str) -> Result<(), AdvisoryLockError> {
        self.markers.lock().remove(key);
        Ok(())
    }
}
