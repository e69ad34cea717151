//! Position readings and fix options.
//!
//! A `Position` is immutable once captured. Later watch updates supersede it
//! by replacement; nothing ever edits a reading in place.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bare coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Return a point shifted by fixed degree deltas.
    pub fn offset(&self, delta_lat: f64, delta_lng: f64) -> Self {
        Self {
            latitude: self.latitude + delta_lat,
            longitude: self.longitude + delta_lng,
        }
    }
}

/// A single normalized location reading from the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Reported horizontal accuracy radius in meters.
    pub accuracy_meters: f64,
    /// When the reading was taken (UTC).
    pub captured_at: DateTime<Utc>,
}

impl Position {
    /// Build a reading captured now.
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at: Utc::now(),
        }
    }

    /// The coordinate part of this reading.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Coordinates formatted the way alert messages render them.
    pub fn coords_label(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }

    /// Clamp to valid ranges and drop non-finite accuracy values.
    ///
    /// Device capabilities occasionally report `NaN` or negative accuracy;
    /// these are normalized to `0.0` (unknown).
    pub fn normalized(mut self) -> Self {
        self.latitude = self.latitude.clamp(-90.0, 90.0);
        self.longitude = self.longitude.clamp(-180.0, 180.0);
        if !self.accuracy_meters.is_finite() || self.accuracy_meters < 0.0 {
            self.accuracy_meters = 0.0;
        }
        self
    }
}

/// Options passed to the device location capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    /// Request GPS-grade accuracy at the cost of power.
    pub high_accuracy: bool,
    /// Oldest cached fix the capability may return instead of a fresh one.
    pub maximum_age: Duration,
    /// How long the capability may take before reporting failure.
    pub timeout: Duration,
}

impl FixOptions {
    /// One-shot, fresh, high-accuracy fix.
    pub fn one_shot(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout,
        }
    }

    /// Continuous low-power watch that tolerates cached fixes.
    pub fn watch(maximum_age: Duration, timeout: Duration) -> Self {
        Self {
            high_accuracy: false,
            maximum_age,
            timeout,
        }
    }
}
