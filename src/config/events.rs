//! Event pipeline settings: bus capacity, storage backends and locks

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where hot events are staged before the drain moves them.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HotStoreBackend {
    #[default]
    Redis,
    Memory,
    /// Events are not staged; late joiners get no replay and nothing drains.
    Disabled,
}

/// Where drained events end up.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurableStoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Per-room channel capacity; the oldest unread event is evicted beyond it
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub hot_store: HotStoreBackend,

    #[serde(default)]
    pub durable_store: DurableStoreBackend,

    #[serde(default = "default_advisory_lock_ttl")]
    pub advisory_lock_ttl_secs: u64,

    /// Frames queued per socket before sends fail with backpressure
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Stateful events scanned when replaying room state to a new connection
    #[serde(default = "default_state_scan_limit")]
    pub state_scan_limit: usize,
}

impl EventsConfig {
    pub fn advisory_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.advisory_lock_ttl_secs)
    }

    pub fn uses_redis(&self) -> bool {
        self.hot_store == HotStoreBackend::Redis
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.channel_capacity == 0 || self.outbound_buffer == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        if self.advisory_lock_ttl_secs == 0 {
            return Err(ValidationError::InvalidLockTtl);
        }
        Ok(())
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            hot_store: HotStoreBackend::default(),
            durable_store: DurableStoreBackend::default(),
            advisory_lock_ttl_secs: default_advisory_lock_ttl(),
            outbound_buffer: default_outbound_buffer(),
            state_scan_limit: default_state_scan_limit(),
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_advisory_lock_ttl() -> u64 {
    30
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_state_scan_limit() -> usize {
    500
}
