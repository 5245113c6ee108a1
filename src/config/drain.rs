//! Hot-to-durable drain schedule

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::events::DrainConfig;

use super::error::ValidationError;

const MAX_BATCH: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct DrainSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Events copied per insert/delete round trip
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Rooms listed per page while scanning for pending events
    #[serde(default = "default_room_page_size")]
    pub room_page_size: usize,
}

impl DrainSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn to_drain_config(&self) -> DrainConfig {
        DrainConfig::default()
            .with_interval(self.interval())
            .with_chunk_size(self.chunk_size)
            .with_room_page_size(self.room_page_size)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidDrainInterval);
        }
        let in_range = |n: usize| (1..=MAX_BATCH).contains(&n);
        if !in_range(self.chunk_size) || !in_range(self.room_page_size) {
            return Err(ValidationError::InvalidDrainBatch);
        }
        Ok(())
    }
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            chunk_size: default_chunk_size(),
            room_page_size: default_room_page_size(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    1200
}

fn default_chunk_size() -> usize {
    100
}

fn default_room_page_size() -> usize {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_drain_every_twenty_minutes() {
        let settings = DrainSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.interval(), Duration::from_secs(20 * 60));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn converts_into_service_config() {
        let settings = DrainSettings {
            interval_secs: 60,
            chunk_size: 25,
            room_page_size: 10,
            ..Default::default()
        };

        let config = settings.to_drain_config();

        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.chunk_size, 25);
        assert_eq!(config.room_page_size, 10);
    }

    #[test]
    fn out_of_range_batches_are_rejected() {
        let zero_chunk = DrainSettings {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(zero_chunk.validate(), Err(ValidationError::InvalidDrainBatch));

        let huge_page = DrainSettings {
            room_page_size: MAX_BATCH + 1,
            ..Default::default()
        };
        assert_eq!(huge_page.validate(), Err(ValidationError::InvalidDrainBatch));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let settings = DrainSettings {
            interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidDrainInterval));
    }
}
