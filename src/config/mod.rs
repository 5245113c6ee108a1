//! Application configuration
//!
//! Loaded from environment variables with the `INTERVIEW_ROOM` prefix;
//! nested values are separated by a double underscore. A `.env` file is
//! read first when present.
//!
//! # Example
//!
//! ```no_run
//! use interview_room::config::AppConfig;
//!
//! // INTERVIEW_ROOM__SERVER__PORT=8080
//! // INTERVIEW_ROOM__EVENTS__HOT_STORE=memory
//! // INTERVIEW_ROOM__DRAIN__INTERVAL_SECS=600
//! let config = AppConfig::load()?;
//! config.validate()?;
//! # Ok::<(), interview_room::config::ConfigError>(())
//! ```

mod database;
mod drain;
mod error;
mod events;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use drain::DrainSettings;
pub use error::{ConfigError, ValidationError};
pub use events::{DurableStoreBackend, EventsConfig, HotStoreBackend};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root configuration. Every section has defaults; backend sections are
/// only required by the backends that use them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub drain: DrainSettings,
}

impl AppConfig {
    /// Load from `.env` and the process environment.
    ///
    /// - `INTERVIEW_ROOM__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `INTERVIEW_ROOM__DATABASE__URL=...` -> `database.url = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("INTERVIEW_ROOM")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate every section, and the backend sections the selected
    /// backends depend on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.events.validate()?;
        self.drain.validate()?;
        if self.events.durable_store == DurableStoreBackend::Postgres {
            self.database.validate()?;
        }
        if self.events.uses_redis() {
            self.redis.validate()?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "INTERVIEW_ROOM__DATABASE__URL",
        "INTERVIEW_ROOM__REDIS__URL",
        "INTERVIEW_ROOM__SERVER__PORT",
        "INTERVIEW_ROOM__SERVER__ENVIRONMENT",
        "INTERVIEW_ROOM__EVENTS__HOT_STORE",
        "INTERVIEW_ROOM__EVENTS__DURABLE_STORE",
        "INTERVIEW_ROOM__EVENTS__CHANNEL_CAPACITY",
        "INTERVIEW_ROOM__DRAIN__INTERVAL_SECS",
        "INTERVIEW_ROOM__DRAIN__ENABLED",
    ];

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        for key in VARS {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.events.channel_capacity, 1024);
        assert_eq!(config.drain.interval_secs, 1200);
        assert!(config.drain.enabled);
    }

    #[test]
    fn nested_values_are_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("INTERVIEW_ROOM__SERVER__PORT", "3000"),
            ("INTERVIEW_ROOM__SERVER__ENVIRONMENT", "production"),
            ("INTERVIEW_ROOM__EVENTS__HOT_STORE", "memory"),
            ("INTERVIEW_ROOM__EVENTS__CHANNEL_CAPACITY", "64"),
            ("INTERVIEW_ROOM__DRAIN__INTERVAL_SECS", "600"),
            ("INTERVIEW_ROOM__DRAIN__ENABLED", "false"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.events.hot_store, HotStoreBackend::Memory);
        assert_eq!(config.events.channel_capacity, 64);
        assert_eq!(config.drain.interval_secs, 600);
        assert!(!config.drain.enabled);
    }

    #[test]
    fn default_backends_require_their_urls() {
        let config = AppConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );

        let config = AppConfig {
            database: DatabaseConfig {
                url: "postgres://localhost/rooms".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("REDIS__URL"))
        );
    }

    #[test]
    fn memory_backends_need_no_urls() {
        let config = AppConfig {
            events: EventsConfig {
                hot_store: HotStoreBackend::Memory,
                durable_store: DurableStoreBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
