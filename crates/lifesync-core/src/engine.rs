//! The SOS session state machine.
//!
//! `SosEngine` orchestrates one citizen's emergency lifecycle:
//!
//!   start → acquire fix → track → rank facilities → confirm & dispatch → stop
//!
//! The engine is the only writer of session control fields (state,
//! notifications, dispatched flag). Every transition publishes a fresh
//! `SessionSnapshot` on a watch channel for the view layer.
//!
//! Each lifecycle gets a new epoch. Work that completes for an older epoch
//! (a late watch reading, a search finishing after stop) is discarded.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lifesync_config::FanOutSettings;
use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    facility::{FacilityCandidate, RankedFacilities},
    notification::{DeliveryStatus, NotificationRecord, RecipientSlot},
    position::Position,
    profile::{emergency_contacts, EmergencyContact},
    session::{ActiveStatus, SessionId, SessionSnapshot, SessionState},
};

use crate::fanout::{DispatchReport, DispatchRequest, NotificationFanOut};
use crate::ranker::FacilityRanker;
use crate::records::RecordStore;
use crate::tracker::PositionTracker;
use crate::traits::{
    LocationProvider, PlaceSearch, ResendDecision, ResendPrompt, ResendRequest, TelephonyLauncher,
};

/// Result of `confirm_and_dispatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A fan-out ran. `resent` is true when it repeated an earlier one.
    Dispatched { report: DispatchReport, resent: bool },
    /// The user declined to resend; the earlier records stand.
    ResendDeclined {
        records: BTreeMap<RecipientSlot, NotificationRecord>,
    },
}

struct SessionInner {
    session_id: Option<SessionId>,
    epoch: u64,
    state: SessionState,
    active_position: Option<Position>,
    ranked: Option<RankedFacilities>,
    notifications: BTreeMap<RecipientSlot, NotificationRecord>,
    /// Fan-outs completed in this lifecycle.
    dispatches: u32,
    /// Cancels in-flight acquisition and searches for the current epoch.
    cancel: CancellationToken,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            session_id: None,
            epoch: 0,
            state: SessionState::Idle,
            active_position: None,
            ranked: None,
            notifications: BTreeMap::new(),
            dispatches: 0,
            cancel: CancellationToken::new(),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            active_position: self.active_position.clone(),
            ranked: self.ranked.clone(),
            notifications: self.notifications.clone(),
            already_dispatched: self.dispatches > 0,
        }
    }

    fn session_label(&self) -> String {
        self.session_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    /// Cancel outstanding work and return to `Idle` under a new epoch.
    fn reset(&mut self) {
        self.cancel.cancel();
        self.epoch += 1;
        self.session_id = None;
        self.state = SessionState::Idle;
        self.active_position = None;
        self.ranked = None;
        self.notifications.clear();
        self.dispatches = 0;
    }
}

/// Shared handle to the session, held by the engine and its watch task.
#[derive(Clone)]
struct SessionCell {
    inner: Arc<Mutex<SessionInner>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionCell {
    fn lock(&self) -> LifeSyncResult<MutexGuard<'_, SessionInner>> {
        self.inner.lock().map_err(|e| LifeSyncError::InvalidTransition {
            from: format!("poisoned session ({})", e),
            event: "access session".to_string(),
        })
    }

    fn publish(&self, inner: &SessionInner) -> SessionSnapshot {
        let snapshot = inner.snapshot();
        self.updates.send_replace(snapshot.clone());
        snapshot
    }
}

pub struct SosEngine<L: LocationProvider, P: PlaceSearch> {
    tracker: PositionTracker<L>,
    ranker: FacilityRanker<P>,
    fanout: NotificationFanOut,
    records: RecordStore,
    telephony: Arc<dyn TelephonyLauncher>,
    prompt: Arc<dyn ResendPrompt>,
    settings: FanOutSettings,
    cell: SessionCell,
}

impl<L: LocationProvider, P: PlaceSearch> SosEngine<L, P> {
    pub fn new(
        tracker: PositionTracker<L>,
        ranker: FacilityRanker<P>,
        fanout: NotificationFanOut,
        records: RecordStore,
        telephony: Arc<dyn TelephonyLauncher>,
        prompt: Arc<dyn ResendPrompt>,
        settings: FanOutSettings,
    ) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            tracker,
            ranker,
            fanout,
            records,
            telephony,
            prompt,
            settings,
            cell: SessionCell {
                inner: Arc::new(Mutex::new(SessionInner::new())),
                updates: Arc::new(updates),
            },
        }
    }

    /// Current view of the session.
    pub fn snapshot(&self) -> LifeSyncResult<SessionSnapshot> {
        Ok(self.cell.lock()?.snapshot())
    }

    /// Receive a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.cell.updates.subscribe()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_tracking()
    }

    /// The fixed-size contact list the next dispatch will target.
    pub fn emergency_contacts(&self) -> LifeSyncResult<Vec<EmergencyContact>> {
        let profile = self.records.profile()?;
        Ok(emergency_contacts(profile.as_ref(), self.settings.contact_slots))
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Start a new SOS lifecycle and drive it to `Active(Ready)`.
    ///
    /// Fails with `LocationUnavailable` (session back to `Idle`) when no fix
    /// can be obtained. If `stop_sos` runs while this is in flight, the call
    /// returns the `Idle` snapshot without error.
    pub async fn start_sos(&self) -> LifeSyncResult<SessionSnapshot> {
        // ── Idle → Acquiring ─────────────────────────────────────────────────
        let (epoch, cancel) = {
            let mut inner = self.cell.lock()?;
            if inner.state != SessionState::Idle {
                return Err(LifeSyncError::InvalidTransition {
                    from: inner.state.to_string(),
                    event: "start".to_string(),
                });
            }
            inner.epoch += 1;
            inner.session_id = Some(SessionId::new());
            inner.state = SessionState::Acquiring;
            inner.active_position = None;
            inner.ranked = None;
            inner.notifications.clear();
            inner.dispatches = 0;
            inner.cancel = CancellationToken::new();
            info!(session_id = %inner.session_label(), "SOS started");
            self.cell.publish(&inner);
            (inner.epoch, inner.cancel.clone())
        };

        let fix = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("acquisition abandoned by stop");
                return self.snapshot();
            }
            fix = self.tracker.acquire() => fix,
        };

        // ── Acquiring → Active(Searching) | Idle ─────────────────────────────
        let position = {
            let mut inner = self.cell.lock()?;
            if inner.epoch != epoch {
                return Ok(inner.snapshot());
            }
            match fix {
                Ok(position) => {
                    inner.active_position = Some(position.clone());
                    inner.state = SessionState::Active(ActiveStatus::Searching);
                    self.cell.publish(&inner);
                    position
                }
                Err(e) => {
                    warn!(session_id = %inner.session_label(), error = %e, "SOS start failed");
                    inner.reset();
                    self.cell.publish(&inner);
                    return Err(e);
                }
            }
        };

        self.start_watch(epoch);

        // ── Active(Searching) → Active(Ready) ────────────────────────────────
        let Some(ranked) = self
            .ranker
            .search_until_cancelled(position.point(), &cancel)
            .await
        else {
            return self.snapshot();
        };
        self.install_ranked(epoch, ranked)
    }

    /// Return to `Idle` from any state. Safe to call repeatedly.
    pub fn stop_sos(&self) -> LifeSyncResult<SessionSnapshot> {
        let stopped_watch = self.tracker.stop_tracking();
        let mut inner = self.cell.lock()?;
        if inner.state != SessionState::Idle {
            info!(
                session_id = %inner.session_label(),
                from = %inner.state,
                stopped_watch,
                "SOS stopped"
            );
        }
        inner.reset();
        Ok(self.cell.publish(&inner))
    }

    /// Re-run the facility search, around `position` if given or the active
    /// position otherwise. Only allowed while the session is active.
    pub async fn refresh_facilities(
        &self,
        position: Option<Position>,
    ) -> LifeSyncResult<RankedFacilities> {
        let (epoch, cancel, center) = {
            let mut inner = self.cell.lock()?;
            if !matches!(inner.state, SessionState::Active(_)) {
                return Err(LifeSyncError::InvalidTransition {
                    from: inner.state.to_string(),
                    event: "refresh facilities".to_string(),
                });
            }
            if let Some(p) = position {
                inner.active_position = Some(p.normalized());
            }
            let center = inner
                .active_position
                .as_ref()
                .map(|p| p.point())
                .ok_or_else(|| LifeSyncError::LocationUnavailable {
                    reason: "no active position".to_string(),
                })?;
            inner.state = SessionState::Active(ActiveStatus::Searching);
            self.cell.publish(&inner);
            (inner.epoch, inner.cancel.clone(), center)
        };

        debug!(lat = center.latitude, lon = center.longitude, "refreshing facilities");

        let ranked = self
            .ranker
            .search_until_cancelled(center, &cancel)
            .await
            .ok_or_else(|| LifeSyncError::InvalidTransition {
                from: SessionState::Idle.to_string(),
                event: "finish facility refresh".to_string(),
            })?;
        self.install_ranked(epoch, ranked.clone())?;
        Ok(ranked)
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Alert every contact and the chosen facility.
    ///
    /// A second dispatch in the same session asks the `ResendPrompt` first;
    /// declining leaves the earlier records and the inbox untouched. If the
    /// messages went out but the inbox append failed, the records are kept,
    /// the session counts as dispatched and the append error is returned.
    pub fn confirm_and_dispatch(&self, facility_id: &str) -> LifeSyncResult<DispatchOutcome> {
        let profile = self.records.profile()?;
        let mut resent = false;

        loop {
            let (epoch, seen, request) = {
                let inner = self.cell.lock()?;
                self.check_dispatchable(&inner, facility_id)?;
                let request = (inner.dispatches > 0).then(|| ResendRequest {
                    session_id: inner.session_label(),
                    facility_name: inner
                        .ranked
                        .as_ref()
                        .and_then(|r| r.find(facility_id))
                        .map(|f| f.name.clone())
                        .unwrap_or_default(),
                    prior_records: inner.notifications.len(),
                });
                (inner.epoch, inner.dispatches, request)
            };

            // The prompt runs without the session lock held.
            if let Some(request) = request {
                let duplicate = LifeSyncError::DispatchDuplicate {
                    session_id: request.session_id.clone(),
                };
                warn!(error = %duplicate, "repeat dispatch requested");
                match self.prompt.confirm_resend(&request) {
                    ResendDecision::Decline => {
                        info!(session_id = %request.session_id, "resend declined");
                        let records = self.cell.lock()?.notifications.clone();
                        return Ok(DispatchOutcome::ResendDeclined { records });
                    }
                    ResendDecision::Confirm => resent = true,
                }
            }

            let mut inner = self.cell.lock()?;
            if inner.epoch != epoch {
                return Err(LifeSyncError::InvalidTransition {
                    from: inner.state.to_string(),
                    event: "dispatch after the session changed".to_string(),
                });
            }
            if inner.dispatches != seen {
                debug!(seen, now = inner.dispatches, "another dispatch finished first");
                continue;
            }

            let facility = self.check_dispatchable(&inner, facility_id)?.clone();
            let position = inner
                .active_position
                .clone()
                .ok_or_else(|| LifeSyncError::LocationUnavailable {
                    reason: "no active position".to_string(),
                })?;
            let session_id = inner.session_label();

            let mut report = self.fanout.dispatch(&DispatchRequest {
                session_id: &session_id,
                profile: profile.as_ref(),
                position: &position,
                facility: &facility,
            });

            inner.notifications = report.records.clone();
            inner.dispatches += 1;
            self.cell.publish(&inner);
            drop(inner);

            info!(
                session_id = %session_id,
                facility = %facility.name,
                sent = report.count_with(DeliveryStatus::Sent),
                failed = report.count_with(DeliveryStatus::Failed),
                resent,
                "alerts dispatched"
            );

            if let Some(e) = report.inbox_error.take() {
                return Err(e);
            }
            if report.alert.is_some() {
                self.telephony.place_call(&facility.dispatch_phone);
            }

            return Ok(DispatchOutcome::Dispatched { report, resent });
        }
    }

    // ── Calls ────────────────────────────────────────────────────────────────

    /// Call a notified recipient and mark their record `Called`.
    pub fn call_recipient(&self, slot: RecipientSlot) -> LifeSyncResult<NotificationRecord> {
        let record = {
            let mut inner = self.cell.lock()?;
            let record = inner
                .notifications
                .get_mut(&slot)
                .ok_or_else(|| LifeSyncError::UnknownRecipient {
                    slot: slot.to_string(),
                })?;
            record.status = DeliveryStatus::Called;
            let record = record.clone();
            self.cell.publish(&inner);
            record
        };
        info!(%slot, to = %record.recipient_name, "calling recipient");
        self.telephony.place_call(&record.recipient_phone);
        Ok(record)
    }

    /// Call a ranked facility's toll-free line.
    pub fn call_facility(&self, facility_id: &str) -> LifeSyncResult<String> {
        let number = {
            let inner = self.cell.lock()?;
            inner
                .ranked
                .as_ref()
                .and_then(|r| r.find(facility_id))
                .map(|f| f.toll_free_phone.clone())
                .ok_or_else(|| LifeSyncError::UnknownFacility {
                    facility_id: facility_id.to_string(),
                })?
        };
        self.telephony.place_call(&number);
        Ok(number)
    }

    pub fn call_emergency_services(&self) -> String {
        let number = self.settings.emergency_number.clone();
        info!(%number, "calling emergency services");
        self.telephony.place_call(&number);
        number
    }

    /// Stop any live session, then clear login state.
    pub fn logout(&self) -> LifeSyncResult<()> {
        self.stop_sos()?;
        self.records.clear_login_state()?;
        info!("citizen logged out");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn check_dispatchable<'a>(
        &self,
        inner: &'a SessionInner,
        facility_id: &str,
    ) -> LifeSyncResult<&'a FacilityCandidate> {
        match inner.state {
            SessionState::Idle => {
                return Err(LifeSyncError::InvalidTransition {
                    from: inner.state.to_string(),
                    event: "dispatch".to_string(),
                })
            }
            SessionState::Acquiring => {
                return Err(LifeSyncError::LocationUnavailable {
                    reason: "position not yet acquired".to_string(),
                })
            }
            SessionState::Active(_) => {}
        }
        if inner.active_position.is_none() {
            return Err(LifeSyncError::LocationUnavailable {
                reason: "no active position".to_string(),
            });
        }
        inner
            .ranked
            .as_ref()
            .and_then(|r| r.find(facility_id))
            .ok_or_else(|| LifeSyncError::UnknownFacility {
                facility_id: facility_id.to_string(),
            })
    }

    fn start_watch(&self, epoch: u64) {
        let cell = self.cell.clone();
        let result = self.tracker.track(move |position| {
            let Ok(mut inner) = cell.lock() else {
                return;
            };
            if inner.epoch != epoch || !matches!(inner.state, SessionState::Active(_)) {
                debug!(epoch, "discarding position update for a finished session");
                return;
            }
            inner.active_position = Some(position);
            cell.publish(&inner);
        });
        if let Err(e) = result {
            warn!(error = %e, "continuous position watch not started");
        }
    }

    fn install_ranked(&self, epoch: u64, ranked: RankedFacilities) -> LifeSyncResult<SessionSnapshot> {
        let mut inner = self.cell.lock()?;
        if inner.epoch != epoch || !matches!(inner.state, SessionState::Active(_)) {
            debug!(epoch, "discarding ranked facilities for a finished session");
            return Ok(inner.snapshot());
        }
        info!(
            session_id = %inner.session_label(),
            count = ranked.facilities.len(),
            provenance = ?ranked.provenance,
            "facilities ready"
        );
        inner.ranked = Some(ranked);
        inner.state = SessionState::Active(ActiveStatus::Ready);
        Ok(self.cell.publish(&inner))
    }
}

impl<L: LocationProvider, P: PlaceSearch> Drop for SosEngine<L, P> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.cell.inner.lock() {
            inner.cancel.cancel();
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
