//! Configuration sections and their defaults.
//!
//! Every field has a default, so an empty TOML document yields a working
//! configuration. Durations are expressed in milliseconds in TOML.
//!
//! Example:
//! ```toml
//! [discovery]
//! radius_m = 3000
//! ready_poll_attempts = 10
//!
//! [inbox]
//! capacity = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub location: LocationSettings,
    pub discovery: DiscoverySettings,
    pub fanout: FanOutSettings,
    pub inbox: InboxSettings,
    pub maps: MapSettings,
    pub storage: StorageSettings,
}

/// Device positioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    /// One-shot fix timeout.
    pub fix_timeout_ms: u64,
    /// Oldest cached fix the continuous watch accepts.
    pub watch_max_age_ms: u64,
}

impl LocationSettings {
    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }

    pub fn watch_max_age(&self) -> Duration {
        Duration::from_millis(self.watch_max_age_ms)
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            fix_timeout_ms: 10_000,
            watch_max_age_ms: 5_000,
        }
    }
}

/// Upper bound on the ranked facility set.
pub const MAX_RANKED_FACILITIES: usize = 3;

/// Facility discovery and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub radius_m: u32,
    pub category: String,
    /// Ranked set is truncated to this many candidates, at most
    /// `MAX_RANKED_FACILITIES`.
    pub max_results: usize,
    /// Assumed urban travel speed used for ETA.
    pub assumed_speed_kmh: f64,
    /// Readiness checks before falling back.
    pub ready_poll_attempts: u32,
    pub ready_poll_interval_ms: u64,
}

impl DiscoverySettings {
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            radius_m: 5_000,
            category: "hospital".to_string(),
            max_results: 3,
            assumed_speed_kmh: 30.0,
            ready_poll_attempts: 20,
            ready_poll_interval_ms: 100,
        }
    }
}

/// Notification fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutSettings {
    /// Contacts per dispatch, padded with placeholders.
    pub contact_slots: usize,
    /// Number dialled by `call_emergency_services`.
    pub emergency_number: String,
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self {
            contact_slots: 5,
            emergency_number: "112".to_string(),
        }
    }
}

/// The shared facility inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxSettings {
    /// Most recent alerts retained.
    pub capacity: usize,
    pub poll_interval_ms: u64,
}

impl InboxSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for InboxSettings {
    fn default() -> Self {
        Self {
            capacity: 50,
            poll_interval_ms: 2_000,
        }
    }
}

/// Map link formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub base_url: String,
    /// Environment variable holding an optional API key.
    pub api_key_env: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/maps".to_string(),
            api_key_env: "LIFESYNC_MAPS_API_KEY".to_string(),
        }
    }
}

/// File-backed persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".lifesync"),
        }
    }
}
