//! RoomEventDispatcher - the sink every producer publishes through.
//!
//! ```text
//!  publish ──► RoomEventBus::write ──► HotEventStore::append
//!                    │
//!                    ▼
//!        flush (per-room keyed lock)
//!          try_drain ─► find_by_room ─► send_to_all
//! ```
//!
//! Flushing under the room's keyed lock gives every connection of a room
//! the room's events in channel order, even with concurrent producers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::adapters::events::RoomEventBus;
use crate::adapters::locks::AsyncKeyedLock;
use crate::adapters::websocket::{CachedEventProvider, TransportSender};
use crate::domain::events::RoomEvent;
use crate::domain::foundation::RoomId;
use crate::ports::{
    ConnectionFilter, ConnectionRegistry, DeliveryReport, HotEventStore, RoomEventSink,
    WriteOutcome,
};

/// Publishes room events to the bus, hot storage and live connections.
pub struct RoomEventDispatcher {
    bus: Arc<RoomEventBus>,
    hot_store: Arc<dyn HotEventStore>,
    registry: Arc<dyn ConnectionRegistry>,
    sender: TransportSender,
    room_locks: AsyncKeyedLock<RoomId>,
    shutdown: CancellationToken,
}

impl RoomEventDispatcher {
    pub fn new(
        bus: Arc<RoomEventBus>,
        hot_store: Arc<dyn HotEventStore>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            bus,
            hot_store,
            registry,
            sender: TransportSender::new(),
            room_locks: AsyncKeyedLock::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop flushing once `token` fires. Events stay queued in the bus.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn bus(&self) -> &Arc<RoomEventBus> {
        &self.bus
    }

    /// Deliver everything queued for the room. Returns the merged report.
    pub async fn flush(&self, room_id: RoomId) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let guard = match self.room_locks.acquire(room_id, &self.shutdown).await {
            Ok(guard) => guard,
            Err(_) => return report,
        };

        while let Some(event) = self.bus.try_drain(room_id) {
            let provider = CachedEventProvider::new(event);
            let targets = self.registry.find_by_room(room_id);
            let delivery = self.sender.send_to_all(&provider, &targets).await;
            if !delivery.failed.is_empty() {
                tracing::debug!(
                    room_id = %room_id,
                    event_id = %provider.event().id(),
                    delivered = delivery.delivered,
                    failed = delivery.failed.len(),
                    "Room event partially delivered"
                );
            }
            report.merge(delivery);
        }

        guard.release();
        report
    }

    /// Release keyed lock entries of rooms nobody is flushing.
    pub fn sweep_idle_locks(&self) -> usize {
        self.room_locks.sweep_idle()
    }
}

#[async_trait]
impl RoomEventSink for RoomEventDispatcher {
    async fn publish(&self, event: RoomEvent) -> WriteOutcome {
        let room_id = event.room_id();

        let outcome = self.bus.write(event.clone());
        if let Err(e) = self.hot_store.append(&event).await {
            tracing::warn!(
                room_id = %room_id,
                event_id = %event.id(),
                error = %e,
                "Failed to stage room event in hot storage"
            );
        }

        self.flush(room_id).await;
        outcome
    }

    async fn deliver_to(&self, event: RoomEvent, filter: &ConnectionFilter) -> DeliveryReport {
        let targets = self.registry.find_by_predicate(event.room_id(), filter);
        let provider = CachedEventProvider::new(event);
        self.sender.send_to_all(&provider, &targets).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::hot_store::InMemoryHotEventStore;
    use crate::adapters::websocket::test_support::RecordingConnection;
    use crate::adapters::websocket::{filters, InMemoryConnectionRegistry};
    use crate::domain::events::EventSpec;
    use crate::domain::foundation::UserId;
    use crate::domain::room::ParticipantType;
    use crate::ports::TransportError;
    use serde_json::json;

    struct Harness {
        dispatcher: RoomEventDispatcher,
        hot: InMemoryHotEventStore,
        registry: Arc<InMemoryConnectionRegistry>,
    }

    fn harness() -> Harness {
        let hot = InMemoryHotEventStore::new();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let dispatcher = RoomEventDispatcher::new(
            Arc::new(RoomEventBus::default()),
            Arc::new(hot.clone()),
            registry.clone(),
        );
        Harness {
            dispatcher,
            hot,
            registry,
        }
    }

    fn join(
        registry: &InMemoryConnectionRegistry,
        room: RoomId,
        user: UserId,
        kind: ParticipantType,
    ) -> Arc<RecordingConnection> {
        let connection = Arc::new(RecordingConnection::new());
        registry.register(room, user, kind, connection.clone());
        connection
    }

    #[tokio::test]
    async fn publish_delivers_stages_and_empties_channel() {
        let h = harness();
        let room = RoomId::new();
        let a = join(&h.registry, room, UserId::new(), ParticipantType::Expert);
        let b = join(&h.registry, room, UserId::new(), ParticipantType::Examinee);

        let outcome = h
            .dispatcher
            .publish(RoomEvent::new(room, "ChatMessage", json!({"message": "hi"}), false))
            .await;

        assert_eq!(outcome, WriteOutcome::Accepted);
        assert_eq!(a.event_types(), vec!["ChatMessage"]);
        assert_eq!(b.event_types(), vec!["ChatMessage"]);
        assert_eq!(h.hot.len(room).await, 1);
        assert_eq!(h.dispatcher.bus().pending(room), 0);
    }

    #[tokio::test]
    async fn events_are_delivered_in_publish_order() {
        let h = harness();
        let room = RoomId::new();
        let connection = join(&h.registry, room, UserId::new(), ParticipantType::Viewer);

        for i in 0..5 {
            h.dispatcher
                .publish(RoomEvent::new(room, format!("E{}", i), json!({}), false))
                .await;
        }

        assert_eq!(connection.event_types(), vec!["E0", "E1", "E2", "E3", "E4"]);
    }

    #[tokio::test]
    async fn other_rooms_receive_nothing() {
        let h = harness();
        let room = RoomId::new();
        let elsewhere = join(&h.registry, RoomId::new(), UserId::new(), ParticipantType::Viewer);

        h.dispatcher
            .publish(RoomEvent::new(room, "Reaction", json!({}), false))
            .await;

        assert!(elsewhere.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_connection_does_not_stop_room_delivery() {
        let h = harness();
        let room = RoomId::new();
        let broken = Arc::new(RecordingConnection::failing(TransportError::Backpressure));
        h.registry
            .register(room, UserId::new(), ParticipantType::Expert, broken);
        let healthy = join(&h.registry, room, UserId::new(), ParticipantType::Expert);

        h.dispatcher
            .publish(RoomEvent::new(room, "Reaction", json!({}), false))
            .await;

        assert_eq!(healthy.event_types(), vec!["Reaction"]);
        assert_eq!(h.dispatcher.bus().pending(room), 0);
    }

    #[tokio::test]
    async fn deliver_to_targets_only_matching_connections_and_skips_storage() {
        let h = harness();
        let room = RoomId::new();
        let target = UserId::new();
        let to_target = join(&h.registry, room, target, ParticipantType::Examinee);
        let bystander = join(&h.registry, room, UserId::new(), ParticipantType::Expert);

        let report = h
            .dispatcher
            .deliver_to(
                RoomEvent::new(room, "SendingSignal", json!({}), false),
                &filters::user(target),
            )
            .await;

        assert_eq!(report.delivered, 1);
        assert_eq!(to_target.event_types(), vec!["SendingSignal"]);
        assert!(bystander.sent().is_empty());
        assert_eq!(h.hot.len(room).await, 0);
        let staged = h
            .hot
            .get_latest(&EventSpec::for_room(room), 10)
            .await
            .unwrap();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn cancelled_dispatcher_keeps_events_queued() {
        let shutdown = CancellationToken::new();
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let bus = Arc::new(RoomEventBus::default());
        let dispatcher = RoomEventDispatcher::new(
            bus.clone(),
            Arc::new(InMemoryHotEventStore::new()),
            registry,
        )
        .with_shutdown(shutdown.clone());
        shutdown.cancel();
        let room = RoomId::new();

        dispatcher
            .publish(RoomEvent::new(room, "Reaction", json!({}), false))
            .await;

        assert_eq!(bus.pending(room), 1);
    }
}
