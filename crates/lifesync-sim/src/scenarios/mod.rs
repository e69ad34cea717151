//! End-to-end scenarios.
//!
//! Each scenario wires a real `SosEngine` to simulated collaborators,
//! prints what happens at each step, and returns a summary the tests and
//! the CLI can check.

pub mod fallback_dispatch;
pub mod live_search;
pub mod repeated_dispatch;

use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    facility::RankedFacilities,
    session::SessionSnapshot,
};

/// The ranked set of a snapshot that should be ready for dispatch.
pub(crate) fn ready_facilities(snapshot: &SessionSnapshot) -> LifeSyncResult<RankedFacilities> {
    snapshot
        .ranked
        .clone()
        .filter(|r| !r.facilities.is_empty())
        .ok_or_else(|| LifeSyncError::InvalidTransition {
            from: snapshot.state.to_string(),
            event: "dispatch without ranked facilities".to_string(),
        })
}

pub(crate) fn print_facilities(ranked: &RankedFacilities) {
    println!("  Facilities ({:?}):", ranked.provenance);
    for (i, f) in ranked.facilities.iter().enumerate() {
        println!(
            "    {}. {:<28} {:>5.2} km  ETA {:>2} min  ICU beds {:>2} (simulated)  {}",
            i + 1,
            f.name,
            f.distance_km,
            f.eta_minutes,
            f.capacity.icu_beds,
            f.open_status
        );
    }
}
