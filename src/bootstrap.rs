//! Process wiring: backends chosen by configuration, services built on top.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Json, Router};
use redis::aio::MultiplexedConnection;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::durable::{InMemoryDurableEventStore, PostgresDurableEventStore};
use crate::adapters::entities::InMemoryEntityStore;
use crate::adapters::events::{DrainConfig, EventDrainService, RoomEventBus};
use crate::adapters::hot_store::{EmptyHotEventStore, InMemoryHotEventStore, RedisHotEventStore};
use crate::adapters::locks::{InMemoryAdvisoryLock, RedisAdvisoryLock};
use crate::adapters::websocket::{live_router, InMemoryConnectionRegistry, LiveState};
use crate::application::change_tracking::{room_pipeline, UnitOfWorkFactory};
use crate::application::live::room_message_dispatcher;
use crate::application::{RoomEventDispatcher, RoomLifecycleService, RoomStateReader};
use crate::config::{
    AppConfig, ConfigError, DatabaseConfig, DurableStoreBackend, EventsConfig, HotStoreBackend,
    RedisConfig, ServerConfig,
};
use crate::ports::{
    AdvisoryLock, ConnectionRegistry, DurableEventStore, EntityStore, HotEventStore,
    RoomEventSink,
};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Timed out connecting to {0}")]
    Timeout(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backends the services run on.
pub struct Backends {
    pub hot_store: Arc<dyn HotEventStore>,
    pub durable_store: Arc<dyn DurableEventStore>,
    pub entities: Arc<dyn EntityStore>,
    pub advisory: Arc<dyn AdvisoryLock>,
}

impl Backends {
    /// Process-local backends.
    pub fn in_memory() -> Self {
        Self {
            hot_store: Arc::new(InMemoryHotEventStore::new()),
            durable_store: Arc::new(InMemoryDurableEventStore::new()),
            entities: Arc::new(InMemoryEntityStore::new()),
            advisory: Arc::new(InMemoryAdvisoryLock::new()),
        }
    }

    /// Connect the backends selected in `config`.
    pub async fn connect(config: &AppConfig) -> Result<Self, StartupError> {
        let redis = if config.events.uses_redis() {
            Some(connect_redis(&config.redis).await?)
        } else {
            None
        };

        let hot_store: Arc<dyn HotEventStore> = match (config.events.hot_store, &redis) {
            (HotStoreBackend::Redis, Some(conn)) => Arc::new(RedisHotEventStore::new(conn.clone())),
            (HotStoreBackend::Disabled, _) => Arc::new(EmptyHotEventStore),
            _ => Arc::new(InMemoryHotEventStore::new()),
        };

        let advisory: Arc<dyn AdvisoryLock> = match &redis {
            Some(conn) => Arc::new(RedisAdvisoryLock::new(conn.clone())),
            None => Arc::new(InMemoryAdvisoryLock::new()),
        };

        let durable_store: Arc<dyn DurableEventStore> = match config.events.durable_store {
            DurableStoreBackend::Postgres => {
                let pool = connect_postgres(&config.database).await?;
                Arc::new(PostgresDurableEventStore::new(pool))
            }
            DurableStoreBackend::Memory => Arc::new(InMemoryDurableEventStore::new()),
        };

        tracing::info!(
            hot_store = ?config.events.hot_store,
            durable_store = ?config.events.durable_store,
            "Storage backends connected"
        );

        Ok(Self {
            hot_store,
            durable_store,
            entities: Arc::new(InMemoryEntityStore::new()),
            advisory,
        })
    }
}

async fn connect_redis(config: &RedisConfig) -> Result<MultiplexedConnection, StartupError> {
    let client = redis::Client::open(config.url.as_str())?;
    let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_tokio_connection())
        .await
        .map_err(|_| StartupError::Timeout("redis"))??;
    tracing::info!("Connected to Redis");
    Ok(conn)
}

async fn connect_postgres(config: &DatabaseConfig) -> Result<sqlx::PgPool, StartupError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;
    tracing::info!("Connected to database");

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    Ok(pool)
}

/// Every long-lived service of the room pipeline.
#[derive(Clone)]
pub struct RoomServices {
    pub bus: Arc<RoomEventBus>,
    pub hot_store: Arc<dyn HotEventStore>,
    pub durable_store: Arc<dyn DurableEventStore>,
    pub entities: Arc<dyn EntityStore>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub dispatcher: Arc<RoomEventDispatcher>,
    pub units: UnitOfWorkFactory,
    pub lifecycle: Arc<RoomLifecycleService>,
    pub live: LiveState,
}

impl RoomServices {
    pub fn assemble(backends: Backends, events: &EventsConfig, shutdown: CancellationToken) -> Self {
        let bus = Arc::new(RoomEventBus::new(events.channel_capacity));
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());

        let dispatcher = Arc::new(
            RoomEventDispatcher::new(bus.clone(), backends.hot_store.clone(), registry.clone())
                .with_shutdown(shutdown),
        );
        let sink: Arc<dyn RoomEventSink> = dispatcher.clone();

        let units = UnitOfWorkFactory::new(
            backends.entities.clone(),
            Arc::new(room_pipeline(sink.clone())),
        );
        let lifecycle = Arc::new(
            RoomLifecycleService::new(units.clone(), bus.clone(), backends.advisory)
                .with_advisory_ttl(events.advisory_lock_ttl()),
        );

        let state_reader = Arc::new(
            RoomStateReader::new(backends.hot_store.clone()).with_scan_limit(events.state_scan_limit),
        );
        let messages = Arc::new(room_message_dispatcher(sink, units.clone()));
        let live = LiveState::new(registry.clone(), messages, state_reader)
            .with_outbound_buffer(events.outbound_buffer);

        Self {
            bus,
            hot_store: backends.hot_store,
            durable_store: backends.durable_store,
            entities: backends.entities,
            registry,
            dispatcher,
            units,
            lifecycle,
            live,
        }
    }

    pub fn drain_service(&self, config: DrainConfig) -> EventDrainService {
        EventDrainService::with_config(self.hot_store.clone(), self.durable_store.clone(), config)
    }

    /// HTTP router: health check and the live endpoint.
    pub fn router(&self, server: &ServerConfig) -> Router {
        let app = Router::new()
            .route("/health", get(health))
            .merge(live_router().with_state(self.live.clone()));

        let origins: Vec<HeaderValue> = server
            .cors_origins_list()
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        let cors = if origins.is_empty() {
            CorsLayer::permissive()
        } else {
            CorsLayer::new().allow_origin(AllowOrigin::list(origins))
        };

        app.layer(cors).layer(TraceLayer::new_for_http())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::room::{Room, RoomStatus};

    #[tokio::test]
    async fn assembled_services_share_one_bus() {
        let services = RoomServices::assemble(
            Backends::in_memory(),
            &EventsConfig::default(),
            CancellationToken::new(),
        );

        assert!(Arc::ptr_eq(services.dispatcher.bus(), &services.bus));
        assert_eq!(services.bus.capacity(), 1024);
    }

    #[tokio::test]
    async fn entity_changes_reach_hot_storage() {
        let services = RoomServices::assemble(
            Backends::in_memory(),
            &EventsConfig::default(),
            CancellationToken::new(),
        );
        let room = Room::new("r");
        let room_id = room.id;
        let mut uow = services.units.begin();
        uow.add(room.clone());
        uow.commit().await.unwrap();

        let mut uow = services.units.begin();
        uow.update(room.with_status(RoomStatus::Active)).await.unwrap();
        uow.commit().await.unwrap();

        let events = services
            .hot_store
            .get_latest(&crate::domain::events::EventSpec::for_room(room_id), 10)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "ChangeRoomStatus");
    }

    #[test]
    fn router_builds_with_and_without_cors_origins() {
        let services = RoomServices::assemble(
            Backends::in_memory(),
            &EventsConfig::default(),
            CancellationToken::new(),
        );

        let _ = services.router(&ServerConfig::default());
        let _ = services.router(&ServerConfig {
            cors_origins: Some("http://localhost:5173".to_string()),
            ..Default::default()
        });
    }
}
