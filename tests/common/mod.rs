//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

use interview_room::adapters::durable::InMemoryDurableEventStore;
use interview_room::adapters::entities::InMemoryEntityStore;
use interview_room::adapters::hot_store::InMemoryHotEventStore;
use interview_room::adapters::locks::InMemoryAdvisoryLock;
use interview_room::bootstrap::{Backends, RoomServices};
use interview_room::config::EventsConfig;
use interview_room::domain::foundation::{ConnectionId, RoomId, UserId};
use interview_room::domain::room::ParticipantType;
use interview_room::ports::{ConnectionRegistry, TransportConnection, TransportError};

/// Connection that keeps every frame it is sent, or rejects them all.
pub struct TestConnection {
    id: ConnectionId,
    frames: Mutex<Vec<JsonValue>>,
    failure: Option<TransportError>,
}

impl TestConnection {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::new(),
            frames: Mutex::new(Vec::new()),
            failure: None,
        })
    }

    pub fn broken(error: TransportError) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::new(),
            frames: Mutex::new(Vec::new()),
            failure: Some(error),
        })
    }

    pub fn frames(&self) -> Vec<JsonValue> {
        self.frames.lock().clone()
    }

    pub fn types(&self) -> Vec<String> {
        self.frames
            .lock()
            .iter()
            .filter_map(|f| f["type"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl TransportConnection for TestConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send_text(&self, text: Arc<str>) -> Result<(), TransportError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let frame = serde_json::from_str(&text)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        self.frames.lock().push(frame);
        Ok(())
    }
}

pub struct Fixture {
    pub services: RoomServices,
    pub hot: InMemoryHotEventStore,
    pub durable: InMemoryDurableEventStore,
    pub entities: InMemoryEntityStore,
}

pub fn fixture() -> Fixture {
    let hot = InMemoryHotEventStore::new();
    let durable = InMemoryDurableEventStore::new();
    let entities = InMemoryEntityStore::new();
    let backends = Backends {
        hot_store: Arc::new(hot.clone()),
        durable_store: Arc::new(durable.clone()),
        entities: Arc::new(entities.clone()),
        advisory: Arc::new(InMemoryAdvisoryLock::new()),
    };
    let services =
        RoomServices::assemble(backends, &EventsConfig::default(), CancellationToken::new());
    Fixture {
        services,
        hot,
        durable,
        entities,
    }
}

impl Fixture {
    pub fn join(&self, room: RoomId, user: UserId, kind: ParticipantType) -> Arc<TestConnection> {
        let connection = TestConnection::healthy();
        self.services
            .registry
            .register(room, user, kind, connection.clone());
        connection
    }
}
