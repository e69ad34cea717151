//! Scenario 1: no registered contacts, facility discovery down.
//!
//! Walk-through:
//!   1. SOS starts at (12.9716, 77.5946) with no stored profile
//!   2. The place search never becomes ready → fallback candidates
//!   3. Dispatch to candidate #1 alerts five placeholder contacts and the
//!      facility, all `Sent`
//!   4. One alert lands in the shared inbox; the facility is called

use std::sync::Arc;

use lifesync_config::EngineConfig;
use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    facility::{FacilityCandidate, Provenance},
    notification::{DeliveryStatus, RecipientKind},
};
use lifesync_core::{traits::{AlertLog, KeyValueStore}, DispatchOutcome};

use crate::devices::{SimulatedLocation, SimulatedPlaces};
use crate::mock_data::CITIZEN_POSITION;
use crate::scenarios::{print_facilities, ready_facilities};
use crate::world::WorldBuilder;

#[derive(Debug, Clone)]
pub struct FallbackDispatchSummary {
    pub provenance: Provenance,
    pub facilities: Vec<FacilityCandidate>,
    pub contact_names: Vec<String>,
    pub facility_records: usize,
    pub all_sent: bool,
    pub alerts_for_session: usize,
    pub calls: Vec<String>,
}

pub async fn run_scenario(
    config: &EngineConfig,
    kv: Arc<dyn KeyValueStore>,
) -> LifeSyncResult<FallbackDispatchSummary> {
    println!("=== Scenario 1: Fallback dispatch without contacts ===");
    println!();

    let world = WorldBuilder::new(config.clone(), kv)
        .build(SimulatedLocation::at(CITIZEN_POSITION), SimulatedPlaces::never_ready());

    // ── Start ─────────────────────────────────────────────────────────────────
    let snapshot = world.engine.start_sos().await?;
    let session_id = snapshot
        .session_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    println!("  Session:  {} ({})", session_id, snapshot.state);
    if let Some(p) = &snapshot.active_position {
        println!("  Position: {}", p.coords_label());
    }

    let ranked = ready_facilities(&snapshot)?;
    print_facilities(&ranked);
    println!();

    // ── Dispatch ──────────────────────────────────────────────────────────────
    let target = ranked.facilities[0].facility_id.clone();
    let report = match world.engine.confirm_and_dispatch(&target)? {
        DispatchOutcome::Dispatched { report, .. } => report,
        DispatchOutcome::ResendDeclined { .. } => {
            return Err(LifeSyncError::InvalidTransition {
                from: "active (ready)".to_string(),
                event: "first dispatch declined".to_string(),
            })
        }
    };

    let contact_names: Vec<String> = report
        .records
        .values()
        .filter(|r| r.recipient_kind == RecipientKind::Contact)
        .map(|r| r.recipient_name.clone())
        .collect();
    let facility_records = report
        .records
        .values()
        .filter(|r| r.recipient_kind == RecipientKind::Facility)
        .count();
    let all_sent = report.records.values().all(|r| r.status == DeliveryStatus::Sent);

    for (slot, record) in &report.records {
        println!(
            "  {:<10} {:<24} {:<18} {:?}",
            slot.to_string(),
            record.recipient_name,
            record.recipient_phone,
            record.status
        );
    }

    let alerts_for_session = world
        .inbox
        .list()?
        .iter()
        .filter(|a| a.session_id == session_id)
        .count();
    let calls = world.telephony.calls();

    println!();
    println!("  Inbox alerts for this session: {}", alerts_for_session);
    println!("  Calls placed:                  {}", calls.join(", "));

    world.engine.stop_sos()?;
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(FallbackDispatchSummary {
        provenance: ranked.provenance,
        facilities: ranked.facilities,
        contact_names,
        facility_records,
        all_sent,
        alerts_for_session,
        calls,
    })
}
