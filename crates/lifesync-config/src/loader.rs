//! Loading and checking `EngineConfig` documents.

use std::path::Path;

use tracing::debug;

use lifesync_contracts::error::{LifeSyncError, LifeSyncResult};

use crate::settings::{EngineConfig, MAX_RANKED_FACILITIES};

impl EngineConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `LifeSyncError::ConfigError` if the TOML is malformed, does
    /// not match the expected shape, or fails `validate()`.
    pub fn from_toml_str(s: &str) -> LifeSyncResult<Self> {
        let config: EngineConfig = toml::from_str(s).map_err(|e| LifeSyncError::ConfigError {
            reason: format!("failed to parse engine TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            radius_m = config.discovery.radius_m,
            inbox_capacity = config.inbox.capacity,
            "engine configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it as engine configuration.
    pub fn from_file(path: &Path) -> LifeSyncResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LifeSyncError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that would make the engine stall or divide by zero.
    pub fn validate(&self) -> LifeSyncResult<()> {
        let checks: [(bool, &str); 9] = [
            (self.location.fix_timeout_ms > 0, "location.fix_timeout_ms must be > 0"),
            (self.discovery.radius_m > 0, "discovery.radius_m must be > 0"),
            (
                (1..=MAX_RANKED_FACILITIES).contains(&self.discovery.max_results),
                "discovery.max_results must be between 1 and 3",
            ),
            (
                self.discovery.assumed_speed_kmh.is_finite() && self.discovery.assumed_speed_kmh > 0.0,
                "discovery.assumed_speed_kmh must be a positive number",
            ),
            (self.discovery.ready_poll_attempts > 0, "discovery.ready_poll_attempts must be > 0"),
            (
                self.discovery.ready_poll_interval_ms > 0,
                "discovery.ready_poll_interval_ms must be > 0",
            ),
            (self.fanout.contact_slots > 0, "fanout.contact_slots must be > 0"),
            (self.inbox.capacity > 0, "inbox.capacity must be > 0"),
            (self.inbox.poll_interval_ms > 0, "inbox.poll_interval_ms must be > 0"),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, reason)) => Err(LifeSyncError::ConfigError {
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}
