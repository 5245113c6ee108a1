//! RoomEventBus - map of room id to its bounded event channel.
//!
//! Concurrency is scoped per room: each room has an independent channel and
//! there is no bus-wide lock. Channels are created on first write or wait
//! and removed only by `drop_room`.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::domain::events::RoomEvent;
use crate::domain::foundation::RoomId;
use crate::ports::WriteOutcome;

use super::channel::{EventChannel, DEFAULT_CHANNEL_CAPACITY};

/// Per-room event bus.
///
/// # Example
///
/// ```ignore
/// let bus = RoomEventBus::new(1024);
/// bus.write(event);
/// while let Some(event) = bus.try_drain(room_id) {
///     deliver(event).await;
/// }
/// ```
pub struct RoomEventBus {
    channels: DashMap<RoomId, Arc<EventChannel>>,
    capacity: usize,
}

impl RoomEventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Get or create the channel for a room. Atomic per key.
    fn channel(&self, room_id: RoomId) -> Arc<EventChannel> {
        self.channels
            .entry(room_id)
            .or_insert_with(|| Arc::new(EventChannel::new(room_id, self.capacity)))
            .value()
            .clone()
    }

    fn existing(&self, room_id: RoomId) -> Option<Arc<EventChannel>> {
        self.channels.get(&room_id).map(|c| c.value().clone())
    }

    /// Queue an event on its room's channel. Never blocks and never fails
    /// from the producer's point of view.
    pub fn write(&self, event: RoomEvent) -> WriteOutcome {
        let room_id = event.room_id();
        let outcome = self.channel(room_id).push(event);
        match outcome {
            WriteOutcome::EvictedOldest(evicted) => {
                tracing::trace!(room_id = %room_id, evicted = %evicted, "Room channel full, evicted oldest event");
            }
            WriteOutcome::Closed => {
                tracing::debug!(room_id = %room_id, "Room channel dropped during write, event discarded");
            }
            WriteOutcome::Accepted => {}
        }
        outcome
    }

    /// Take the next event for a room, if one is waiting.
    ///
    /// Does not create a channel for an unknown room.
    pub fn try_drain(&self, room_id: RoomId) -> Option<RoomEvent> {
        self.existing(room_id)?.try_pop()
    }

    /// Wait for the next event of a room.
    ///
    /// Returns `None` if the room is dropped or `cancel` fires.
    pub async fn wait(&self, room_id: RoomId, cancel: &CancellationToken) -> Option<RoomEvent> {
        let channel = self.channel(room_id);
        channel.recv(cancel).await
    }

    /// Close and discard a room's channel. Waiters observe `None`; a later
    /// write creates a fresh channel.
    pub fn drop_room(&self, room_id: RoomId) -> bool {
        match self.channels.remove(&room_id) {
            Some((_, channel)) => {
                let discarded = channel.close();
                tracing::debug!(room_id = %room_id, discarded, "Dropped room channel");
                true
            }
            None => false,
        }
    }

    /// Number of unread events queued for a room.
    pub fn pending(&self, room_id: RoomId) -> usize {
        self.existing(room_id).map(|c| c.len()).unwrap_or(0)
    }

    /// Rooms that currently have a channel.
    pub fn active_rooms(&self) -> Vec<RoomId> {
        self.channels.iter().map(|entry| *entry.key()).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RoomEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn event(room: RoomId, n: usize) -> RoomEvent {
        RoomEvent::new(room, "ChatMessage", json!({ "n": n }), false)
    }

    fn drain_all(bus: &RoomEventBus, room: RoomId) -> Vec<RoomEvent> {
        std::iter::from_fn(|| bus.try_drain(room)).collect()
    }

    #[test]
    fn try_drain_on_unknown_room_is_none_and_creates_nothing() {
        let bus = RoomEventBus::default();
        let room = RoomId::new();

        assert!(bus.try_drain(room).is_none());
        assert!(bus.active_rooms().is_empty());
    }

    #[test]
    fn rooms_are_isolated() {
        let bus = RoomEventBus::new(4);
        let a = RoomId::new();
        let b = RoomId::new();

        bus.write(event(a, 1));
        bus.write(event(b, 2));

        assert_eq!(bus.pending(a), 1);
        assert_eq!(bus.pending(b), 1);
        assert_eq!(bus.try_drain(a).unwrap().room_id(), a);
        assert_eq!(bus.try_drain(b).unwrap().room_id(), b);
        assert_eq!(bus.active_rooms().len(), 2);
    }

    #[test]
    fn drop_room_discards_channel_and_later_write_recreates_it() {
        let bus = RoomEventBus::new(4);
        let room = RoomId::new();
        bus.write(event(room, 1));

        assert!(bus.drop_room(room));
        assert!(!bus.drop_room(room));
        assert_eq!(bus.pending(room), 0);

        assert_eq!(bus.write(event(room, 2)), WriteOutcome::Accepted);
        assert_eq!(bus.try_drain(room).unwrap().payload()["n"], 2);
    }

    #[tokio::test]
    async fn wait_is_released_by_drop_room() {
        let bus = Arc::new(RoomEventBus::new(4));
        let room = RoomId::new();
        let cancel = CancellationToken::new();

        let waiter = {
            let bus = bus.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { bus.wait(room, &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.drop_room(room);

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn concurrent_first_writes_share_one_channel() {
        let bus = Arc::new(RoomEventBus::new(1024));
        let room = RoomId::new();

        let mut handles = Vec::new();
        for task in 0..8 {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..50 {
                    bus.write(event(room, task * 100 + n));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(bus.active_rooms(), vec![room]);
        assert_eq!(bus.pending(room), 400);
    }

    proptest! {
        #[test]
        fn writes_within_capacity_drain_in_write_order(count in 0usize..64, capacity in 64usize..128) {
            let bus = RoomEventBus::new(capacity);
            let room = RoomId::new();
            let written: Vec<_> = (0..count).map(|n| event(room, n)).collect();

            for e in &written {
                prop_assert_eq!(bus.write(e.clone()), WriteOutcome::Accepted);
            }

            prop_assert_eq!(drain_all(&bus, room), written);
        }

        #[test]
        fn overflow_keeps_newest_and_never_exceeds_capacity(capacity in 1usize..32, extra in 1usize..64) {
            let bus = RoomEventBus::new(capacity);
            let room = RoomId::new();
            let written: Vec<_> = (0..capacity + extra).map(|n| event(room, n)).collect();

            let mut evicted = Vec::new();
            for e in &written {
                if let Some(id) = bus.write(e.clone()).evicted() {
                    evicted.push(id);
                }
                prop_assert!(bus.pending(room) <= capacity);
            }

            let expected_evicted: Vec<_> = written[..extra].iter().map(|e| e.id()).collect();
            prop_assert_eq!(evicted, expected_evicted);
            prop_assert_eq!(drain_all(&bus, room), written[extra..].to_vec());
        }
    }
}
