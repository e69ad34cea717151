//! Canonical location URLs for alert messages.

use lifesync_config::MapSettings;
use lifesync_contracts::position::GeoPoint;

/// Builds `{base_url}?q={lat},{lng}` links, with `&key=` when configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLinkFormatter {
    base_url: String,
    api_key: Option<String>,
}

impl MapLinkFormatter {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Build from settings, reading the API key from the configured
    /// environment variable if it is set.
    pub fn from_settings(settings: &MapSettings) -> Self {
        let api_key = std::env::var(&settings.api_key_env).ok();
        Self::new(settings.base_url.clone(), api_key)
    }

    pub fn link(&self, point: GeoPoint) -> String {
        let mut url = format!("{}?q={},{}", self.base_url, point.latitude, point.longitude);
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(key);
        }
        url
    }
}

impl Default for MapLinkFormatter {
    fn default() -> Self {
        Self::new(MapSettings::default().base_url, None)
    }
}
