//! Ranked facility candidates.
//!
//! The ranker produces a fresh `RankedFacilities` on every search; a later
//! search replaces the whole set. Candidates are never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::position::GeoPoint;

/// Capacity figures that do not come from any live feed.
///
/// The name is deliberate: these values are placeholders drawn by a
/// `CapacityFeed` and must never be presented as real availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedCapacity {
    pub icu_beds: u32,
}

/// Whether the place reported itself open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenStatus {
    Open,
    CheckHours,
}

impl std::fmt::Display for OpenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::CheckHours => write!(f, "Check Hours"),
        }
    }
}

/// One nearby emergency-care facility, ready for display or dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityCandidate {
    /// Identifier the view layer passes back to `confirm_and_dispatch`.
    pub facility_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Great-circle distance from the search center.
    pub distance_km: f64,
    /// `ceil(distance_km / assumed_speed_kmh * 60)`; not a routing estimate.
    pub eta_minutes: u32,
    pub rating: Option<f32>,
    pub capacity: SimulatedCapacity,
    pub dispatch_phone: String,
    pub toll_free_phone: String,
    pub open_status: OpenStatus,
    /// Identifier assigned by the place-search capability, if any.
    pub external_id: Option<String>,
}

impl FacilityCandidate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Where a ranked set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Results from the external place-search capability.
    Live,
    /// Deterministic synthetic candidates used when discovery failed.
    Fallback,
}

/// The output of one ranker search.
///
/// Invariant: `facilities` is sorted ascending by `distance_km` and holds at
/// most the configured number of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFacilities {
    pub center: GeoPoint,
    pub facilities: Vec<FacilityCandidate>,
    pub provenance: Provenance,
    pub searched_at: DateTime<Utc>,
}

impl RankedFacilities {
    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    pub fn find(&self, facility_id: &str) -> Option<&FacilityCandidate> {
        self.facilities.iter().find(|f| f.facility_id == facility_id)
    }
}
