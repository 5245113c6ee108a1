//! AdvisoryLock port - cross-process, best-effort "someone is working on
//! this" markers.
//!
//! The marker is written with a TTL into a shared cache. Acquisition is a
//! check followed by a write, not an atomic test-and-set: two processes can
//! both acquire the same key in a narrow race. Use it to avoid redundant
//! work between cooperating servers, never to guard correctness.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that can occur in advisory lock operations.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryLockError {
    #[error("Lock backend unavailable: {0}")]
    Unavailable(String),
}

impl From<AdvisoryLockError> for DomainError {
    fn from(err: AdvisoryLockError) -> Self {
        DomainError::new(ErrorCode::CacheError, err.to_string())
    }
}

/// Port for advisory, TTL-based locks.
#[async_trait]
pub trait AdvisoryLock: Send + Sync {
    /// Write the marker unless one is present. Returns `false` if the key
    /// was already held.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, AdvisoryLockError>;

    /// True if a non-expired marker exists.
    async fn is_held(&self, key: &str) -> Result<bool, AdvisoryLockError>;

    /// Remove the marker early.
    async fn release(&self, key: &str) -> Result<(), AdvisoryLockError>;
}
