//! TransportConnection port - one live endpoint of a participant.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode};

/// Errors that can occur when writing to a live connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer went away
    #[error("Connection closed")]
    Closed,

    /// The connection's outbound queue is full
    #[error("Connection outbound queue is full")]
    Backpressure,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<TransportError> for DomainError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Serialization(msg) => {
                DomainError::new(ErrorCode::SerializationError, msg)
            }
            other => DomainError::new(ErrorCode::TransportError, other.to_string()),
        }
    }
}

/// A live, text-framed connection to one client.
#[async_trait]
pub trait TransportConnection: Send + Sync {
    fn id(&self) -> ConnectionId;

    /// Queue an already-serialized message for the client.
    async fn send_text(&self, text: Arc<str>) -> Result<(), TransportError>;
}

/// Outcome of a fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<ConnectionId>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.failed.extend(other.failed);
    }
}
