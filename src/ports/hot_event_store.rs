//! HotEventStore port - fast, ephemeral staging area for recent room events.
//!
//! Events are appended here as they are published and stay until the drain
//! service has copied them into durable storage. Live readers use the store
//! to fetch the latest state for late joiners.
//!
//! ## Implementations
//!
//! - `InMemoryHotEventStore` - process-local, for tests and single-node runs
//! - `EmptyHotEventStore` - hot storage disabled; accepts and forgets
//! - `RedisHotEventStore` - shared cache for multi-server deployments

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::domain::events::{EventSpec, RoomEvent};
use crate::domain::foundation::{DomainError, ErrorCode, RoomId};

/// Errors that can occur in hot event store operations.
#[derive(Debug, thiserror::Error)]
pub enum HotStoreError {
    /// Backing cache could not be reached or rejected the command
    #[error("Hot store unavailable: {0}")]
    Unavailable(String),

    /// A stored entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<HotStoreError> for DomainError {
    fn from(err: HotStoreError) -> Self {
        match err {
            HotStoreError::Unavailable(msg) => DomainError::new(ErrorCode::CacheError, msg),
            HotStoreError::Serialization(msg) => {
                DomainError::new(ErrorCode::SerializationError, msg)
            }
        }
    }
}

/// Port for the hot event store.
///
/// Ordering contract: `fetch_page` and `query_by_spec` return events
/// oldest-first by `created_at` (ties broken by id); `get_latest` returns
/// newest-first.
#[async_trait]
pub trait HotEventStore: Send + Sync {
    /// Stage an event.
    async fn append(&self, event: &RoomEvent) -> Result<(), HotStoreError>;

    /// Read one page of matching events, oldest-first.
    async fn fetch_page(
        &self,
        spec: &EventSpec,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError>;

    /// Latest `limit` matching events, newest-first.
    async fn get_latest(
        &self,
        spec: &EventSpec,
        limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError>;

    /// Remove the given events. Missing events are ignored.
    ///
    /// Returns the number of events actually removed.
    async fn delete(&self, events: &[RoomEvent]) -> Result<u64, HotStoreError>;

    /// Rooms that currently hold staged events, ascending by id, starting
    /// strictly after `after`.
    async fn pending_rooms(
        &self,
        after: Option<RoomId>,
        limit: usize,
    ) -> Result<Vec<RoomId>, HotStoreError>;

    /// Lazily page through every matching event in batches of `page_size`.
    ///
    /// Each batch is fetched only when the previous one has been consumed,
    /// so memory stays bounded by one page. The stream ends after the first
    /// short or empty page, or after the first error.
    fn query_by_spec(
        &self,
        spec: EventSpec,
        page_size: usize,
    ) -> BoxStream<'_, Result<Vec<RoomEvent>, HotStoreError>> {
        let page_size = page_size.max(1);
        stream::try_unfold(
            (spec, 0usize, false),
            move |(spec, offset, exhausted)| async move {
                if exhausted {
                    return Ok(None);
                }
                let batch = self.fetch_page(&spec, offset, page_size).await?;
                if batch.is_empty() {
                    return Ok(None);
                }
                let exhausted = batch.len() < page_size;
                let next = offset + batch.len();
                Ok(Some((batch, (spec, next, exhausted))))
            },
        )
        .boxed()
    }
}
