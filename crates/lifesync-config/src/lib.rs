//! # lifesync-config
//!
//! TOML configuration for the LifeSync dispatch engine.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use lifesync_config::EngineConfig;
//!
//! let config = EngineConfig::from_file(Path::new("lifesync.toml"))?;
//! ```
//!
//! Missing sections and fields fall back to the defaults in [`settings`].

pub mod loader;
pub mod settings;

pub use settings::{
    DiscoverySettings, EngineConfig, FanOutSettings, InboxSettings, LocationSettings,
    MapSettings, StorageSettings, MAX_RANKED_FACILITIES,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lifesync_contracts::error::LifeSyncError;

    use crate::EngineConfig;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();

        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.location.fix_timeout(), Duration::from_secs(10));
        assert_eq!(config.location.watch_max_age(), Duration::from_secs(5));
        assert_eq!(config.discovery.radius_m, 5_000);
        assert_eq!(config.discovery.category, "hospital");
        assert_eq!(config.discovery.max_results, 3);
        assert_eq!(config.discovery.ready_poll_attempts, 20);
        assert_eq!(config.discovery.ready_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.fanout.contact_slots, 5);
        assert_eq!(config.inbox.capacity, 50);
        assert_eq!(config.inbox.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml = r#"
            [discovery]
            radius_m = 3000

            [inbox]
            capacity = 10
        "#;

        let config = EngineConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.discovery.radius_m, 3000);
        assert_eq!(config.discovery.max_results, 3);
        assert_eq!(config.inbox.capacity, 10);
        assert_eq!(config.inbox.poll_interval_ms, 2_000);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let result = EngineConfig::from_toml_str("[discovery\nradius_m = ");
        match result {
            Err(LifeSyncError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse engine TOML"), "got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = EngineConfig::from_toml_str("[inbox]\ncapacity = 0\n");
        match result {
            Err(LifeSyncError::ConfigError { reason }) => {
                assert!(reason.contains("inbox.capacity"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn oversized_ranked_set_is_rejected() {
        let result = EngineConfig::from_toml_str("[discovery]\nmax_results = 4\n");
        match result {
            Err(LifeSyncError::ConfigError { reason }) => {
                assert!(reason.contains("discovery.max_results"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
        assert!(EngineConfig::from_toml_str("[discovery]\nmax_results = 3\n").is_ok());
    }

    #[test]
    fn zero_ready_poll_interval_is_rejected() {
        let result = EngineConfig::from_toml_str("[discovery]\nready_poll_interval_ms = 0\n");
        match result {
            Err(LifeSyncError::ConfigError { reason }) => {
                assert!(reason.contains("discovery.ready_poll_interval_ms"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn non_positive_speed_is_rejected() {
        let result = EngineConfig::from_toml_str("[discovery]\nassumed_speed_kmh = 0.0\n");
        assert!(matches!(result, Err(LifeSyncError::ConfigError { .. })));
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = EngineConfig::from_file(std::path::Path::new("/definitely/not/here.toml"));
        match result {
            Err(LifeSyncError::ConfigError { reason }) => {
                assert!(reason.contains("failed to read config file"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }
}
