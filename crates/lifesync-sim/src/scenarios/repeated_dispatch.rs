//! Scenario 2: a double-tap on "call ambulance".
//!
//! Walk-through:
//!   1. A registered citizen (two contacts) starts an SOS
//!   2. First dispatch alerts everyone and writes one inbox alert
//!   3. Second dispatch asks for confirmation; the user declines, nothing
//!      changes
//!   4. Third dispatch is confirmed; a second alert is written
//!   5. Stop clears the session's records

use std::sync::Arc;

use lifesync_config::EngineConfig;
use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    profile::Role,
};
use lifesync_core::{
    traits::{AlertLog, KeyValueStore, ResendDecision},
    DispatchOutcome,
};

use crate::devices::{SimulatedLocation, SimulatedPlaces};
use crate::mock_data::{registered_profile, CITIZEN_POSITION};
use crate::recorders::ScriptedPrompt;
use crate::scenarios::ready_facilities;
use crate::world::WorldBuilder;

#[derive(Debug, Clone)]
pub struct RepeatedDispatchSummary {
    pub first_records: usize,
    pub first_contact: String,
    pub declined_unchanged: bool,
    pub alerts_after_decline: usize,
    pub alerts_after_confirm: usize,
    pub prompts_shown: usize,
    pub cleared_on_stop: bool,
}

pub async fn run_scenario(
    config: &EngineConfig,
    kv: Arc<dyn KeyValueStore>,
) -> LifeSyncResult<RepeatedDispatchSummary> {
    println!("=== Scenario 2: Repeated dispatch guard ===");
    println!();

    let world = WorldBuilder::new(config.clone(), kv)
        .prompt(ScriptedPrompt::new([ResendDecision::Decline, ResendDecision::Confirm]))
        .build(SimulatedLocation::at(CITIZEN_POSITION), SimulatedPlaces::never_ready());

    // ── Register ──────────────────────────────────────────────────────────────
    let login = world.accounts.login(Role::Citizen)?;
    if login.needs_registration {
        world.accounts.register_profile(&registered_profile())?;
        println!("  Registered profile for {}", registered_profile().name);
    }

    // ── Start and first dispatch ──────────────────────────────────────────────
    let snapshot = world.engine.start_sos().await?;
    let session_id = snapshot
        .session_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let target = ready_facilities(&snapshot)?.facilities[0].facility_id.clone();
    let session_alerts = || -> LifeSyncResult<usize> {
        Ok(world
            .inbox
            .list()?
            .iter()
            .filter(|a| a.session_id == session_id)
            .count())
    };

    let first = match world.engine.confirm_and_dispatch(&target)? {
        DispatchOutcome::Dispatched { report, .. } => report,
        DispatchOutcome::ResendDeclined { .. } => {
            return Err(LifeSyncError::InvalidTransition {
                from: "active (ready)".to_string(),
                event: "first dispatch declined".to_string(),
            })
        }
    };
    let first_contact = first
        .records
        .values()
        .next()
        .map(|r| r.recipient_name.clone())
        .unwrap_or_default();
    println!(
        "  First dispatch:   {} records, {} alert(s) in inbox",
        first.records.len(),
        session_alerts()?
    );

    // ── Second tap, declined ──────────────────────────────────────────────────
    let declined = world.engine.confirm_and_dispatch(&target)?;
    let declined_unchanged = matches!(
        &declined,
        DispatchOutcome::ResendDeclined { records } if *records == first.records
    ) && world.engine.snapshot()?.notifications == first.records;
    let alerts_after_decline = session_alerts()?;
    println!(
        "  Second tap:       declined, records unchanged = {}, {} alert(s)",
        declined_unchanged, alerts_after_decline
    );

    // ── Third tap, confirmed ──────────────────────────────────────────────────
    world.engine.confirm_and_dispatch(&target)?;
    let alerts_after_confirm = session_alerts()?;
    println!("  Third tap:        confirmed, {} alert(s)", alerts_after_confirm);

    // ── Stop ──────────────────────────────────────────────────────────────────
    let stopped = world.engine.stop_sos()?;
    let cleared_on_stop = stopped.notifications.is_empty() && !stopped.already_dispatched;
    println!("  Stopped:          {} (records cleared = {})", stopped.state, cleared_on_stop);
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(RepeatedDispatchSummary {
        first_records: first.records.len(),
        first_contact,
        declined_unchanged,
        alerts_after_decline,
        alerts_after_confirm,
        prompts_shown: world.prompt.asked().len(),
        cleared_on_stop,
    })
}
