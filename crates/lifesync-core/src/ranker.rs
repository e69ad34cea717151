//! Facility discovery and ranking with deterministic fallback.
//!
//! Search pipeline:
//!
//!   wait for readiness (bounded poll) → nearby query → distance/ETA →
//!   sort ascending → truncate
//!
//! Any failure along the live path (never ready, non-OK status, zero
//! results, query timeout) yields the fixed fallback set instead, so a
//! session always ends up with facilities to act on. The result carries a
//! `Provenance` flag saying which path produced it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lifesync_config::{DiscoverySettings, MAX_RANKED_FACILITIES};
use lifesync_contracts::{
    error::LifeSyncError,
    facility::{FacilityCandidate, OpenStatus, Provenance, RankedFacilities, SimulatedCapacity},
    position::GeoPoint,
};

use crate::{
    geo::{distance_km, eta_minutes},
    traits::{CapacityFeed, PlaceQuery, PlaceResult, PlaceSearch, SearchStatus},
};

/// A synthetic facility placed at a fixed offset from the search center.
struct FallbackSite {
    name: &'static str,
    address: &'static str,
    delta_lat: f64,
    delta_lng: f64,
    icu_beds: u32,
    dispatch_phone: &'static str,
    toll_free_phone: &'static str,
}

const FALLBACK_SITES: [FallbackSite; 3] = [
    FallbackSite {
        name: "City General Hospital",
        address: "123 Medical St, Downtown",
        delta_lat: 0.010,
        delta_lng: 0.008,
        icu_beds: 4,
        dispatch_phone: "+91 98765 10001",
        toll_free_phone: "1800-CITY-911",
    },
    FallbackSite {
        name: "St. Mary ICU Center",
        address: "456 Healthcare Ave, North Zone",
        delta_lat: -0.018,
        delta_lng: 0.012,
        icu_beds: 2,
        dispatch_phone: "+91 98765 10002",
        toll_free_phone: "1800-MARY-911",
    },
    FallbackSite {
        name: "Metro Health Complex",
        address: "789 Wellness Rd, Metro Circle",
        delta_lat: 0.024,
        delta_lng: -0.026,
        icu_beds: 12,
        dispatch_phone: "+91 98765 10003",
        toll_free_phone: "1800-METRO-911",
    },
];

enum LiveOutcome {
    Found(Vec<FacilityCandidate>),
    Unavailable(LifeSyncError),
    Cancelled,
}

/// Ranks nearby facilities from a `PlaceSearch` capability.
pub struct FacilityRanker<P: PlaceSearch> {
    places: Arc<P>,
    capacity: Arc<dyn CapacityFeed>,
    settings: DiscoverySettings,
}

impl<P: PlaceSearch> FacilityRanker<P> {
    /// `settings.max_results` is capped at `MAX_RANKED_FACILITIES`.
    pub fn new(
        places: Arc<P>,
        capacity: Arc<dyn CapacityFeed>,
        mut settings: DiscoverySettings,
    ) -> Self {
        settings.max_results = settings.max_results.min(MAX_RANKED_FACILITIES);
        Self {
            places,
            capacity,
            settings,
        }
    }

    /// Total time the live path may take before falling back.
    pub fn search_window(&self) -> Duration {
        self.settings.ready_poll_interval() * self.settings.ready_poll_attempts
    }

    /// Rank facilities around `center`. Always resolves.
    pub async fn search(&self, center: GeoPoint) -> RankedFacilities {
        let never = CancellationToken::new();
        match self.search_until_cancelled(center, &never).await {
            Some(ranked) => ranked,
            None => self.fallback(center),
        }
    }

    /// Rank facilities around `center`, abandoning the work if `cancel`
    /// fires first. Returns `None` only on cancellation.
    pub async fn search_until_cancelled(
        &self,
        center: GeoPoint,
        cancel: &CancellationToken,
    ) -> Option<RankedFacilities> {
        match self.search_live(center, cancel).await {
            LiveOutcome::Found(facilities) => {
                info!(count = facilities.len(), "live facility search succeeded");
                Some(RankedFacilities {
                    center,
                    facilities,
                    provenance: Provenance::Live,
                    searched_at: Utc::now(),
                })
            }
            LiveOutcome::Unavailable(e) => {
                warn!(error = %e, "facility discovery unavailable, using fallback candidates");
                Some(self.fallback(center))
            }
            LiveOutcome::Cancelled => {
                debug!("facility search cancelled");
                None
            }
        }
    }

    /// The deterministic synthetic set for `center`.
    pub fn fallback(&self, center: GeoPoint) -> RankedFacilities {
        let mut facilities: Vec<FacilityCandidate> = FALLBACK_SITES
            .iter()
            .enumerate()
            .map(|(i, site)| {
                let point = center.offset(site.delta_lat, site.delta_lng);
                let distance = distance_km(center, point);
                FacilityCandidate {
                    facility_id: format!("fallback-{}", i + 1),
                    name: site.name.to_string(),
                    address: site.address.to_string(),
                    latitude: point.latitude,
                    longitude: point.longitude,
                    distance_km: distance,
                    eta_minutes: eta_minutes(distance, self.settings.assumed_speed_kmh),
                    rating: None,
                    capacity: SimulatedCapacity {
                        icu_beds: site.icu_beds,
                    },
                    dispatch_phone: site.dispatch_phone.to_string(),
                    toll_free_phone: site.toll_free_phone.to_string(),
                    open_status: OpenStatus::Open,
                    external_id: None,
                }
            })
            .collect();

        sort_by_distance(&mut facilities);
        facilities.truncate(self.settings.max_results);

        RankedFacilities {
            center,
            facilities,
            provenance: Provenance::Fallback,
            searched_at: Utc::now(),
        }
    }

    async fn search_live(&self, center: GeoPoint, cancel: &CancellationToken) -> LiveOutcome {
        // ── Readiness poll ───────────────────────────────────────────────────
        let mut ready = false;
        for attempt in 0..self.settings.ready_poll_attempts {
            if self.places.is_ready() {
                ready = true;
                break;
            }
            debug!(attempt, "place search not ready yet");
            tokio::select! {
                _ = cancel.cancelled() => return LiveOutcome::Cancelled,
                _ = tokio::time::sleep(self.settings.ready_poll_interval()) => {}
            }
        }
        if !ready {
            return LiveOutcome::Unavailable(LifeSyncError::DiscoveryUnavailable {
                reason: format!(
                    "place search not ready after {} attempts",
                    self.settings.ready_poll_attempts
                ),
            });
        }

        // ── Nearby query ─────────────────────────────────────────────────────
        let query = PlaceQuery {
            center,
            radius_m: self.settings.radius_m,
            category: self.settings.category.clone(),
        };
        let response = tokio::select! {
            _ = cancel.cancelled() => return LiveOutcome::Cancelled,
            r = tokio::time::timeout(self.search_window(), self.places.nearby(&query)) => match r {
                Ok(response) => response,
                Err(_) => {
                    return LiveOutcome::Unavailable(LifeSyncError::DiscoveryUnavailable {
                        reason: "place search query timed out".to_string(),
                    })
                }
            },
        };

        if response.status != SearchStatus::Ok {
            return LiveOutcome::Unavailable(LifeSyncError::DiscoveryUnavailable {
                reason: format!("place search returned {}", response.status),
            });
        }
        if response.results.is_empty() {
            return LiveOutcome::Unavailable(LifeSyncError::DiscoveryUnavailable {
                reason: "place search returned no results".to_string(),
            });
        }

        // ── Rank ─────────────────────────────────────────────────────────────
        let mut scored: Vec<(f64, &PlaceResult)> = response
            .results
            .iter()
            .map(|place| (distance_km(center, place.location), place))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(self.settings.max_results);

        let facilities = scored
            .into_iter()
            .enumerate()
            .map(|(i, (distance, place))| self.live_candidate(i, distance, place))
            .collect();

        LiveOutcome::Found(facilities)
    }

    fn live_candidate(&self, index: usize, distance: f64, place: &PlaceResult) -> FacilityCandidate {
        FacilityCandidate {
            facility_id: place
                .place_id
                .clone()
                .unwrap_or_else(|| format!("live-{}", index + 1)),
            name: place.name.clone(),
            address: place
                .vicinity
                .clone()
                .unwrap_or_else(|| "Address not available".to_string()),
            latitude: place.location.latitude,
            longitude: place.location.longitude,
            distance_km: distance,
            eta_minutes: eta_minutes(distance, self.settings.assumed_speed_kmh),
            rating: place.rating,
            capacity: self.capacity.capacity_for(place),
            dispatch_phone: format!("+91 98765 1000{}", index),
            toll_free_phone: format!("1800-HOSPITAL-{}", index),
            open_status: if place.open_now == Some(true) {
                OpenStatus::Open
            } else {
                OpenStatus::CheckHours
            },
            external_id: place.place_id.clone(),
        }
    }
}

fn sort_by_distance(facilities: &mut [FacilityCandidate]) {
    facilities.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
}

// ── Tests ────────────────────────────────────────────────────────────────────
