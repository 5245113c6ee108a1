//! RoomEventSink port - where producers hand over derived room events.
//!
//! Change processors and live handlers depend on this port only; the
//! application wires it to the bus, the hot store and live delivery.

use async_trait::async_trait;

use crate::domain::events::RoomEvent;
use crate::domain::foundation::EventId;

use super::{ConnectionRegistration, DeliveryReport};

/// Result of admitting an event into a room channel.
///
/// Every variant is a success from the producer's point of view; the
/// distinction only feeds logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Queued without loss.
    Accepted,
    /// Queued after evicting the oldest unread event.
    EvictedOldest(EventId),
    /// The room's channel was dropped concurrently; the event was discarded.
    Closed,
}

impl WriteOutcome {
    pub fn evicted(&self) -> Option<EventId> {
        match self {
            WriteOutcome::EvictedOldest(id) => Some(*id),
            _ => None,
        }
    }
}

/// Predicate over live registrations, used for targeted delivery.
pub type ConnectionFilter = dyn Fn(&ConnectionRegistration) -> bool + Send + Sync;

/// Port for publishing room events.
#[async_trait]
pub trait RoomEventSink: Send + Sync {
    /// Publish an event to the room: queue, stage and deliver live.
    async fn publish(&self, event: RoomEvent) -> WriteOutcome;

    /// Deliver an event only to matching connections of its room, without
    /// queueing or staging it.
    async fn deliver_to(&self, event: RoomEvent, filter: &ConnectionFilter) -> DeliveryReport;
}
