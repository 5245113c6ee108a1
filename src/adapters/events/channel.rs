//! EventChannel - bounded, drop-oldest queue for one room.
//!
//! A fixed-capacity ring buffer guarded by a short critical section, plus a
//! `Notify` as the set of waiting consumers. Producers never wait: when the
//! buffer is full the oldest unread event is evicted to admit the new one.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::domain::events::RoomEvent;
use crate::domain::foundation::RoomId;
use crate::ports::WriteOutcome;

/// Default capacity of a room channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

struct ChannelState {
    queue: VecDeque<RoomEvent>,
    closed: bool,
}

/// Multi-producer, multi-consumer queue of one room's events.
pub struct EventChannel {
    room_id: RoomId,
    capacity: usize,
    state: Mutex<ChannelState>,
    readable: Notify,
}

impl EventChannel {
    /// Create a channel. A capacity of zero is raised to one.
    pub fn new(room_id: RoomId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            room_id,
            capacity,
            state: Mutex::new(ChannelState {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            readable: Notify::new(),
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admit an event, evicting the oldest unread one if the buffer is full.
    pub fn push(&self, event: RoomEvent) -> WriteOutcome {
        let outcome = {
            let mut state = self.state.lock();
            if state.closed {
                return WriteOutcome::Closed;
            }
            let outcome = if state.queue.len() >= self.capacity {
                state
                    .queue
                    .pop_front()
                    .map(|evicted| WriteOutcome::EvictedOldest(evicted.id()))
                    .unwrap_or(WriteOutcome::Accepted)
            } else {
                WriteOutcome::Accepted
            };
            state.queue.push_back(event);
            outcome
        };
        self.readable.notify_one();
        outcome
    }

    /// Take the oldest unread event without waiting.
    pub fn try_pop(&self) -> Option<RoomEvent> {
        self.state.lock().queue.pop_front()
    }

    /// Wait for the next event.
    ///
    /// Returns `None` when the channel is closed and empty, or when `cancel`
    /// fires.
    pub async fn recv(&self, cancel: &CancellationToken) -> Option<RoomEvent> {
        loop {
            let notified = self.readable.notified();
            tokio::pin!(notified);
            // Register before checking the queue so a push in between is not missed.
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(event) = state.queue.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Close the channel, discard unread events and wake every waiter.
    ///
    /// Returns the number of discarded events.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            state.closed = true;
            let discarded = state.queue.len();
            state.queue.clear();
            discarded
        };
        self.readable.notify_waiters();
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("room_id", &self.room_id)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn event(room: RoomId, n: u32) -> RoomEvent {
        RoomEvent::new(room, "ChatMessage", json!({ "n": n }), false)
    }

    #[test]
    fn push_then_pop_preserves_order() {
        let room = RoomId::new();
        let channel = EventChannel::new(room, 4);
        let events: Vec<_> = (0..3).map(|n| event(room, n)).collect();

        for e in &events {
            assert_eq!(channel.push(e.clone()), WriteOutcome::Accepted);
        }

        let drained: Vec<_> = std::iter::from_fn(|| channel.try_pop()).collect();
        assert_eq!(drained, events);
        assert!(channel.try_pop().is_none());
    }

    #[test]
    fn full_channel_evicts_oldest() {
        let room = RoomId::new();
        let channel = EventChannel::new(room, 2);
        let first = event(room, 1);
        let first_id = first.id();

        channel.push(first);
        channel.push(event(room, 2));
        let outcome = channel.push(event(room, 3));

        assert_eq!(outcome, WriteOutcome::EvictedOldest(first_id));
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.try_pop().unwrap().payload()["n"], 2);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let channel = EventChannel::new(RoomId::new(), 0);
        assert_eq!(channel.capacity(), 1);
    }

    #[test]
    fn closed_channel_rejects_writes() {
        let room = RoomId::new();
        let channel = EventChannel::new(room, 2);
        channel.push(event(room, 1));

        assert_eq!(channel.close(), 1);
        assert!(channel.is_closed());
        assert_eq!(channel.push(event(room, 2)), WriteOutcome::Closed);
        assert!(channel.is_empty());
    }

    #[tokio::test]
    async fn recv_wakes_on_push() {
        let room = RoomId::new();
        let channel = Arc::new(EventChannel::new(room, 8));
        let cancel = CancellationToken::new();

        let reader = {
            let channel = channel.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { channel.recv(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        let sent = event(room, 7);
        channel.push(sent.clone());

        let received = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, Some(sent));
    }

    #[tokio::test]
    async fn recv_returns_none_on_close_and_cancel() {
        let channel = Arc::new(EventChannel::new(RoomId::new(), 8));
        let cancel = CancellationToken::new();

        let reader = {
            let channel = channel.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { channel.recv(&cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        channel.close();
        assert_eq!(reader.await.unwrap(), None);

        let open = EventChannel::new(RoomId::new(), 8);
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        assert_eq!(open.recv(&cancelled).await, None);
    }
}
