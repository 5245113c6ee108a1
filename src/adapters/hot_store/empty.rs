//! Hot event store used when hot storage is disabled.
//!
//! Events are still delivered live through the bus, but nothing is staged,
//! so late joiners get no state and the drain service finds no work.

use async_trait::async_trait;

use crate::domain::events::{EventSpec, RoomEvent};
use crate::domain::foundation::RoomId;
use crate::ports::{HotEventStore, HotStoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyHotEventStore;

#[async_trait]
impl HotEventStore for EmptyHotEventStore {
    async fn append(&self, _event: &RoomEvent) -> Result<(), HotStoreError> {
        Ok(())
    }

    async fn fetch_page(
        &self,
        _spec: &EventSpec,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        Ok(Vec::new())
    }

    async fn get_latest(
        &self,
        _spec: &EventSpec,
        _limit: usize,
    ) -> Result<Vec<RoomEvent>, HotStoreError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _events: &[RoomEvent]) -> Result<u64, HotStoreError> {
        Ok(0)
    }

    async fn pending_rooms(
        &self,
        _after: Option<RoomId>,
        _limit: usize,
    ) -> Result<Vec<RoomId>, HotStoreError> {
        Ok(Vec::new())
    }
}
