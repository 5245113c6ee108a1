//! Serialize-once fan-out to live connections.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::domain::events::RoomEvent;
use crate::ports::{ConnectionRegistration, DeliveryReport, TransportConnection, TransportError};

use super::messages::OutboundEvent;

/// Wraps one event and serializes it at most once, however many
/// connections it is sent to.
#[derive(Debug)]
pub struct CachedEventProvider {
    event: RoomEvent,
    serialized: OnceCell<Arc<str>>,
}

impl CachedEventProvider {
    pub fn new(event: RoomEvent) -> Self {
        Self {
            event,
            serialized: OnceCell::new(),
        }
    }

    pub fn event(&self) -> &RoomEvent {
        &self.event
    }

    /// The wire text of the event; the first call serializes it.
    pub fn serialized(&self) -> Result<Arc<str>, TransportError> {
        self.serialized
            .get_or_try_init(|| {
                serde_json::to_string(&OutboundEvent::from(&self.event))
                    .map(Arc::from)
                    .map_err(|e| TransportError::Serialization(e.to_string()))
            })
            .cloned()
    }
}

/// Sends provided events to connections.
///
/// A failing connection never prevents delivery to the others; failures
/// are collected in the returned [`DeliveryReport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportSender;

impl TransportSender {
    pub fn new() -> Self {
        Self
    }

    pub async fn send(
        &self,
        provider: &CachedEventProvider,
        connection: &dyn TransportConnection,
    ) -> Result<(), TransportError> {
        let text = provider.serialized()?;
        connection.send_text(text).await
    }

    pub async fn send_to_all(
        &self,
        provider: &CachedEventProvider,
        registrations: &[ConnectionRegistration],
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if registrations.is_empty() {
            return report;
        }

        let text = match provider.serialized() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    event_id = %provider.event().id(),
                    error = %e,
                    "Failed to serialize room event"
                );
                report.failed = registrations.iter().map(|r| r.connection_id()).collect();
                return report;
            }
        };

        for registration in registrations {
            match registration.connection.send_text(text.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        room_id = %registration.room_id,
                        connection_id = %registration.connection_id(),
                        event_id = %provider.event().id(),
                        error = %e,
                        "Failed to deliver room event"
                    );
                    report.failed.push(registration.connection_id());
                }
            }
        }
        report
    }
}
