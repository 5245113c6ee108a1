//! AsyncKeyedLock - in-process mutual exclusion per key.
//!
//! One async mutex per distinct key, created on first use. Two tasks
//! acquiring the same key are serialized; tasks on different keys never
//! wait on each other. Entries are not removed on release; call
//! [`AsyncKeyedLock::sweep_idle`] periodically if the key space is
//! unbounded.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors from keyed lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// Cancellation fired before the lock became free
    #[error("Lock acquisition cancelled")]
    Cancelled,
}

impl From<LockError> for DomainError {
    fn from(err: LockError) -> Self {
        DomainError::new(ErrorCode::Cancelled, err.to_string())
    }
}

/// Keyed async lock.
pub struct AsyncKeyedLock<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> AsyncKeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Returns [`LockError::Cancelled`] if `cancel` fires first, including
    /// when it has already fired.
    pub async fn acquire(
        &self,
        key: K,
        cancel: &CancellationToken,
    ) -> Result<KeyedLockGuard<K>, LockError> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LockError::Cancelled),
            guard = mutex.lock_owned() => Ok(KeyedLockGuard { key, _guard: guard }),
        }
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(&self, key: K) -> Option<KeyedLockGuard<K>> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        mutex
            .try_lock_owned()
            .ok()
            .map(|guard| KeyedLockGuard { key, _guard: guard })
    }

    /// Remove entries that nobody holds or waits on. Returns how many were
    /// removed.
    pub fn sweep_idle(&self) -> usize {
        let before = self.locks.len();
        // Holders and waiters keep a clone of the Arc.
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of keys with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for AsyncKeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one key. Released on drop.
pub struct KeyedLockGuard<K> {
    key: K,
    _guard: OwnedMutexGuard<()>,
}

impl<K> KeyedLockGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Release explicitly.
    pub fn release(self) {}
}

impl<K: fmt::Debug> fmt::Debug for KeyedLockGuard<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLockGuard").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_mutually_exclusive() {
        let lock = Arc::new(AsyncKeyedLock::<String>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = lock.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                let guard = lock.acquire("close-room:1".to_string(), &cancel).await.unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
                guard.release();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let lock = AsyncKeyedLock::<&'static str>::new();
        let cancel = CancellationToken::new();

        let _a = lock.acquire("a", &cancel).await.unwrap();
        let b = tokio::time::timeout(Duration::from_millis(100), lock.acquire("b", &cancel)).await;

        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn cancellation_releases_waiter() {
        let lock = Arc::new(AsyncKeyedLock::<u32>::new());
        let cancel = CancellationToken::new();
        let held = lock.acquire(1, &cancel).await.unwrap();

        let waiter_cancel = CancellationToken::new();
        let waiter = {
            let lock = lock.clone();
            let waiter_cancel = waiter_cancel.clone();
            tokio::spawn(async move { lock.acquire(1, &waiter_cancel).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter_cancel.cancel();

        assert_eq!(waiter.await.unwrap(), Err(LockError::Cancelled));
        assert_eq!(held.key(), &1);
    }

    #[tokio::test]
    async fn try_acquire_fails_while_held() {
        let lock = AsyncKeyedLock::<u32>::new();
        let guard = lock.try_acquire(7).unwrap();
        assert!(lock.try_acquire(7).is_none());
        drop(guard);
        assert!(lock.try_acquire(7).is_some());
    }

    #[tokio::test]
    async fn sweep_removes_only_idle_entries() {
        let lock = AsyncKeyedLock::<u32>::new();
        let cancel = CancellationToken::new();
        let held = lock.acquire(1, &cancel).await.unwrap();
        lock.acquire(2, &cancel).await.unwrap().release();

        assert_eq!(lock.len(), 2);
        assert_eq!(lock.sweep_idle(), 1);
        assert_eq!(lock.len(), 1);

        drop(held);
        assert_eq!(lock.sweep_idle(), 1);
        assert!(lock.is_empty());
    }
}
