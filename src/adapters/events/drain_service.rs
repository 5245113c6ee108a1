//! EventDrainService - background migration of hot events into durable
//! storage.
//!
//! Each cycle walks the rooms that still hold hot events, page by page, and
//! drains them one at a time:
//!
//! 1. Read the oldest `chunk_size` hot events of the room
//! 2. Insert them into durable storage
//! 3. Delete exactly those events from hot storage
//! 4. Repeat until the room has no hot events, then append a drain marker
//!
//! A chunk is deleted only after its insert succeeded, so a failure or a
//! shutdown between steps leaves the chunk in hot storage for the next
//! cycle. Durable inserts ignore ids that already exist, which makes the
//! re-attempt safe.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 20 min | Time between cycle starts |
//! | `chunk_size` | 100 | Events migrated per insert/delete round |
//! | `room_page_size` | 200 | Pending rooms fetched per page |
//!
//! ## Shutdown
//!
//! Cancellation is checked between pages, rooms and chunks. A chunk that
//! has started is always completed or abandoned before its delete.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::events::{DurableEvent, EventSpec, QueuedRoomEvent};
use crate::domain::foundation::{DomainError, ErrorCode, RoomId, Timestamp};
use crate::ports::{DurableEventStore, HotEventStore};

/// Configuration for the EventDrainService.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Time between the start of two cycles.
    pub interval: Duration,

    /// Events per insert/delete round.
    pub chunk_size: usize,

    /// Pending rooms fetched per page.
    pub room_page_size: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20 * 60),
            chunk_size: 100,
            room_page_size: 200,
        }
    }
}

impl DrainConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn with_room_page_size(mut self, size: usize) -> Self {
        self.room_page_size = size.max(1);
        self
    }
}

/// Summary of one drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub rooms_drained: usize,
    /// Rooms already drained by another worker since this cycle started.
    pub rooms_skipped: usize,
    pub rooms_failed: Vec<RoomId>,
    pub events_migrated: u64,
    pub cancelled: bool,
}

enum RoomDrain {
    Drained(u64),
    Skipped,
    Cancelled(u64),
}

/// Background service that drains hot events into durable storage.
pub struct EventDrainService {
    hot: Arc<dyn HotEventStore>,
    durable: Arc<dyn DurableEventStore>,
    config: DrainConfig,
}

impl EventDrainService {
    /// Create a drain service with default configuration.
    pub fn new(hot: Arc<dyn HotEventStore>, durable: Arc<dyn DurableEventStore>) -> Self {
        Self::with_config(hot, durable, DrainConfig::default())
    }

    pub fn with_config(
        hot: Arc<dyn HotEventStore>,
        durable: Arc<dyn DurableEventStore>,
        config: DrainConfig,
    ) -> Self {
        Self {
            hot,
            durable,
            config,
        }
    }

    pub fn config(&self) -> &DrainConfig {
        &self.config
    }

    /// Run cycles on the configured interval until cancelled.
    ///
    /// The first cycle starts immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.interval.as_secs(),
            chunk_size = self.config.chunk_size,
            room_page_size = self.config.room_page_size,
            "Event drain service started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Event drain service stopped");
                    return;
                }
                _ = interval.tick() => {
                    let report = self.run_cycle(&cancel).await;
                    if report.rooms_drained > 0 || !report.rooms_failed.is_empty() {
                        info!(
                            rooms_drained = report.rooms_drained,
                            rooms_skipped = report.rooms_skipped,
                            rooms_failed = report.rooms_failed.len(),
                            events_migrated = report.events_migrated,
                            "Drain cycle finished"
                        );
                    } else {
                        debug!("Drain cycle found no pending rooms");
                    }
                    if report.cancelled {
                        info!("Event drain service stopped mid-cycle");
                        return;
                    }
                }
            }
        }
    }

    /// Run exactly one drain cycle.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> DrainReport {
        let cycle_started_at = Timestamp::now();
        let mut report = DrainReport::default();
        let mut after: Option<RoomId> = None;

        loop {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return report;
            }

            let rooms = match self
                .hot
                .pending_rooms(after, self.config.room_page_size)
                .await
            {
                Ok(rooms) => rooms,
                Err(e) => {
                    error!(error = %e, "Failed to list rooms pending drain");
                    return report;
                }
            };
            let Some(last) = rooms.last().copied() else {
                return report;
            };
            after = Some(last);

            for room_id in rooms {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    return report;
                }

                match self.drain_room(room_id, cycle_started_at, cancel).await {
                    Ok(RoomDrain::Drained(count)) => {
                        report.rooms_drained += 1;
                        report.events_migrated += count;
                        debug!(room_id = %room_id, events = count, "Room drained");
                    }
                    Ok(RoomDrain::Skipped) => {
                        report.rooms_skipped += 1;
                    }
                    Ok(RoomDrain::Cancelled(count)) => {
                        report.events_migrated += count;
                        report.cancelled = true;
                        return report;
                    }
                    Err(e) => {
                        error!(room_id = %room_id, error = %e, "Failed to drain room events");
                        report.rooms_failed.push(room_id);
                    }
                }
            }
        }
    }

    async fn drain_room(
        &self,
        room_id: RoomId,
        cycle_started_at: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<RoomDrain, DomainError> {
        if let Some(drained_at) = self.durable.last_drained_at(room_id).await? {
            if !drained_at.is_before(&cycle_started_at) {
                return Ok(RoomDrain::Skipped);
            }
        }

        let spec = EventSpec::for_room(room_id);
        let mut migrated = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Ok(RoomDrain::Cancelled(migrated));
            }

            let chunk = self.hot.fetch_page(&spec, 0, self.config.chunk_size).await?;
            if chunk.is_empty() {
                break;
            }

            let migrated_at = Timestamp::now();
            let rows: Vec<DurableEvent> = chunk
                .iter()
                .map(|event| DurableEvent::from_room_event(event, migrated_at))
                .collect();
            self.durable.insert_batch(&rows).await?;

            let deleted = self.hot.delete(&chunk).await?;
            if deleted == 0 {
                return Err(DomainError::new(
                    ErrorCode::CacheError,
                    "Hot store did not remove a migrated chunk",
                )
                .with_detail("room_id", room_id.to_string()));
            }
            migrated += chunk.len() as u64;
        }

        self.durable
            .append_marker(&QueuedRoomEvent::new(room_id))
            .await?;
        Ok(RoomDrain::Drained(migrated))
    }
}
