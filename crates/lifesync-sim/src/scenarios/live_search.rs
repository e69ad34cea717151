//! Scenario 3: live discovery and the facility's side of the handoff.
//!
//! Walk-through:
//!   1. The place search needs a few readiness checks, then answers with
//!      six nearby places
//!   2. The nearest three are ranked with live provenance
//!   3. The citizen dispatches to the nearest facility
//!   4. The facility logs in and its inbox poller surfaces the alert

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use lifesync_config::EngineConfig;
use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    facility::Provenance,
};
use lifesync_core::{traits::KeyValueStore, DispatchOutcome};
use lifesync_store::spawn_inbox_poller;

use crate::devices::{SimulatedLocation, SimulatedPlaces};
use crate::mock_data::{facility_account, nearby_places, CITIZEN_POSITION};
use crate::scenarios::{print_facilities, ready_facilities};
use crate::world::WorldBuilder;

#[derive(Debug, Clone)]
pub struct LiveSearchSummary {
    pub provenance: Provenance,
    pub facility_names: Vec<String>,
    pub readiness_checks: u32,
    pub dispatched_to: String,
    /// Alerts for the logged-in facility seen by its first poll.
    pub alerts_seen_by_facility: usize,
}

pub async fn run_scenario(
    config: &EngineConfig,
    kv: Arc<dyn KeyValueStore>,
) -> LifeSyncResult<LiveSearchSummary> {
    println!("=== Scenario 3: Live search and facility inbox ===");
    println!();

    let world = WorldBuilder::new(config.clone(), kv)
        .build(SimulatedLocation::at(CITIZEN_POSITION), SimulatedPlaces::live(nearby_places(), 3));

    // ── Citizen side ──────────────────────────────────────────────────────────
    let snapshot = world.engine.start_sos().await?;
    let ranked = ready_facilities(&snapshot)?;
    print_facilities(&ranked);

    let nearest = ranked.facilities[0].clone();
    let report = match world.engine.confirm_and_dispatch(&nearest.facility_id)? {
        DispatchOutcome::Dispatched { report, .. } => report,
        DispatchOutcome::ResendDeclined { .. } => {
            return Err(LifeSyncError::InvalidTransition {
                from: "active (ready)".to_string(),
                event: "first dispatch declined".to_string(),
            })
        }
    };
    println!();
    println!("  Dispatched {} records to {}", report.records.len(), nearest.name);

    // ── Facility side ─────────────────────────────────────────────────────────
    world.accounts.register_facility(&facility_account())?;
    let account = world
        .accounts
        .facility_login(&facility_account().facility_name, &facility_account().credential_secret)?;

    let cancel = CancellationToken::new();
    let (poller, mut view) = spawn_inbox_poller(
        world.inbox.clone(),
        config.inbox.poll_interval(),
        cancel.clone(),
    );
    view.changed().await.map_err(|e| LifeSyncError::StorageFailed {
        reason: format!("inbox poller ended early: {}", e),
    })?;
    let alerts_seen_by_facility = view
        .borrow_and_update()
        .alerts
        .iter()
        .filter(|a| a.facility_name == account.facility_name)
        .count();
    cancel.cancel();
    let _ = poller.await;

    println!(
        "  {} sees {} incoming alert(s)",
        account.facility_name, alerts_seen_by_facility
    );

    world.engine.stop_sos()?;
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(LiveSearchSummary {
        provenance: ranked.provenance,
        facility_names: ranked.facilities.iter().map(|f| f.name.clone()).collect(),
        readiness_checks: world.places.readiness_checks(),
        dispatched_to: nearest.name,
        alerts_seen_by_facility,
    })
}
