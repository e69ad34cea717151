//! Simulated device and network capabilities.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    position::{FixOptions, GeoPoint, Position},
};
use lifesync_core::traits::{
    LocationProvider, PlaceQuery, PlaceResponse, PlaceResult, PlaceSearch, SearchStatus,
};

// ── Location ──────────────────────────────────────────────────────────────────

/// How the simulated device answers a one-shot request.
#[derive(Debug, Clone)]
pub enum FixScript {
    At { point: GeoPoint, accuracy_meters: f64 },
    Denied,
    /// Never answers; the caller's timeout decides.
    Silent,
}

/// A device at a fixed spot that drifts slightly while watched.
pub struct SimulatedLocation {
    fix: FixScript,
    drift: Vec<GeoPoint>,
    drift_interval: Duration,
}

impl SimulatedLocation {
    pub fn at(point: GeoPoint) -> Self {
        Self {
            fix: FixScript::At {
                point,
                accuracy_meters: 8.0,
            },
            drift: vec![],
            drift_interval: Duration::from_secs(1),
        }
    }

    pub fn denied() -> Self {
        Self {
            fix: FixScript::Denied,
            drift: vec![],
            drift_interval: Duration::from_secs(1),
        }
    }

    pub fn silent() -> Self {
        Self {
            fix: FixScript::Silent,
            drift: vec![],
            drift_interval: Duration::from_secs(1),
        }
    }

    /// Readings the watch emits, one per `interval`, after it starts.
    pub fn with_drift(mut self, drift: Vec<GeoPoint>, interval: Duration) -> Self {
        self.drift = drift;
        self.drift_interval = interval;
        self
    }
}

impl LocationProvider for SimulatedLocation {
    async fn get_once(&self, options: FixOptions) -> LifeSyncResult<Position> {
        match &self.fix {
            FixScript::At {
                point,
                accuracy_meters,
            } => {
                debug!(high_accuracy = options.high_accuracy, "simulated fix");
                Ok(Position::new(point.latitude, point.longitude, *accuracy_meters))
            }
            FixScript::Denied => Err(LifeSyncError::LocationUnavailable {
                reason: "location permission denied".to_string(),
            }),
            FixScript::Silent => std::future::pending().await,
        }
    }

    fn watch(&self, options: FixOptions) -> LifeSyncResult<mpsc::Receiver<Position>> {
        if matches!(self.fix, FixScript::Denied) {
            return Err(LifeSyncError::LocationUnavailable {
                reason: "location permission denied".to_string(),
            });
        }
        let (tx, rx) = mpsc::channel(4);
        let drift = self.drift.clone();
        let interval = self.drift_interval;
        debug!(max_age_ms = options.maximum_age.as_millis() as u64, "simulated watch started");

        tokio::spawn(async move {
            for point in drift {
                tokio::time::sleep(interval).await;
                if tx
                    .send(Position::new(point.latitude, point.longitude, 15.0))
                    .await
                    .is_err()
                {
                    debug!("simulated watch receiver dropped");
                    return;
                }
            }
            // Hold the channel open until the watcher goes away.
            tx.closed().await;
        });
        Ok(rx)
    }
}

// ── Place search ──────────────────────────────────────────────────────────────

/// A place search that becomes ready after `ready_after` checks and then
/// answers every query with `response`.
pub struct SimulatedPlaces {
    ready_after: u32,
    checks: AtomicU32,
    response: PlaceResponse,
}

impl SimulatedPlaces {
    pub fn live(results: Vec<PlaceResult>, ready_after: u32) -> Self {
        Self {
            ready_after,
            checks: AtomicU32::new(0),
            response: PlaceResponse {
                status: SearchStatus::Ok,
                results,
            },
        }
    }

    /// Never loads, as when the maps library cannot be fetched.
    pub fn never_ready() -> Self {
        Self {
            ready_after: u32::MAX,
            checks: AtomicU32::new(0),
            response: PlaceResponse {
                status: SearchStatus::UnknownError,
                results: vec![],
            },
        }
    }

    /// Loads but refuses every query with `status`.
    pub fn failing(status: SearchStatus) -> Self {
        Self {
            ready_after: 0,
            checks: AtomicU32::new(0),
            response: PlaceResponse {
                status,
                results: vec![],
            },
        }
    }

    pub fn readiness_checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

impl PlaceSearch for SimulatedPlaces {
    fn is_ready(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) >= self.ready_after
    }

    async fn nearby(&self, query: &PlaceQuery) -> PlaceResponse {
        debug!(
            radius_m = query.radius_m,
            category = %query.category,
            status = %self.response.status,
            results = self.response.results.len(),
            "simulated nearby search"
        );
        self.response.clone()
    }
}
