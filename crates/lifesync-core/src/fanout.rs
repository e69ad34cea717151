//! Notification fan-out: one composed record per contact slot plus one for
//! the chosen facility.
//!
//! Delivery is handed to a `MessageGateway`. Records are composed `Pending`
//! and settle to `Sent` or `Failed` from the gateway's answer. When the
//! facility record is `Sent`, a `DispatchedAlert` is appended to the shared
//! inbox. Messages are already out by then, so an append failure is carried
//! in the report rather than discarding the records.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    facility::FacilityCandidate,
    notification::{DeliveryStatus, DispatchedAlert, NotificationRecord, RecipientKind, RecipientSlot},
    position::Position,
    profile::{emergency_contacts, Profile},
};

use crate::maplink::MapLinkFormatter;
use crate::traits::{AlertLog, MessageGateway};

/// Everything one fan-out needs.
#[derive(Debug, Clone)]
pub struct DispatchRequest<'a> {
    pub session_id: &'a str,
    pub profile: Option<&'a Profile>,
    pub position: &'a Position,
    pub facility: &'a FacilityCandidate,
}

/// Result of one fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub records: BTreeMap<RecipientSlot, NotificationRecord>,
    /// The inbox entry, present only when the facility record was sent and
    /// the append succeeded.
    pub alert: Option<DispatchedAlert>,
    /// Why the inbox append failed, if it did.
    pub inbox_error: Option<LifeSyncError>,
}

impl DispatchReport {
    pub fn facility_record(&self) -> Option<&NotificationRecord> {
        self.records.get(&RecipientSlot::Facility)
    }

    pub fn count_with(&self, status: DeliveryStatus) -> usize {
        self.records.values().filter(|r| r.status == status).count()
    }
}

/// Gateway that "sends" by logging the composed message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingGateway;

impl MessageGateway for LoggingGateway {
    fn deliver(&self, record: &NotificationRecord) -> LifeSyncResult<()> {
        info!(
            to = %record.recipient_name,
            phone = %record.recipient_phone,
            message = %record.message_body,
            "simulated alert delivery"
        );
        Ok(())
    }
}

pub struct NotificationFanOut {
    gateway: Arc<dyn MessageGateway>,
    maps: MapLinkFormatter,
    contact_slots: usize,
    alerts: Arc<dyn AlertLog>,
}

impl NotificationFanOut {
    pub fn new(
        gateway: Arc<dyn MessageGateway>,
        maps: MapLinkFormatter,
        contact_slots: usize,
        alerts: Arc<dyn AlertLog>,
    ) -> Self {
        Self {
            gateway,
            maps,
            contact_slots,
            alerts,
        }
    }

    /// Compose, deliver and record one alert per recipient.
    ///
    /// Gateway refusals become `Failed` records; an inbox append failure
    /// lands in `DispatchReport::inbox_error`.
    pub fn dispatch(&self, request: &DispatchRequest<'_>) -> DispatchReport {
        let now = Utc::now();
        let patient = PatientSummary::from_profile(request.profile);
        let map_link = self.maps.link(request.position.point());
        let coords = request.position.coords_label();
        let facility = request.facility;

        let mut records = BTreeMap::new();

        // ── Contacts ─────────────────────────────────────────────────────────
        for (i, contact) in emergency_contacts(request.profile, self.contact_slots)
            .into_iter()
            .enumerate()
        {
            let body = format!(
                "EMERGENCY ALERT!\nName: {}\nAge: {}\nBlood: {}\nLocation: {}\nTime: {}\nMap: {}\nHospital: {} ({:.6}, {:.6})",
                patient.name,
                patient.age,
                patient.blood_group,
                coords,
                time_label(now),
                map_link,
                facility.name,
                facility.latitude,
                facility.longitude,
            );
            let record = NotificationRecord {
                recipient_kind: RecipientKind::Contact,
                recipient_name: contact.display_name,
                recipient_phone: contact.phone_number,
                status: DeliveryStatus::Pending,
                message_body: body,
                composed_at: now,
            };
            records.insert(RecipientSlot::Contact(i), self.deliver(record));
        }

        // ── Facility ─────────────────────────────────────────────────────────
        let body = format!(
            "INCOMING EMERGENCY!\nPatient: {}\nAge: {}\nBlood: {}\nLocation: {}\nTime: {}\nMap: {}\nHospital: {} ({:.6}, {:.6})\nETA: {} mins\nDispatch: {}",
            patient.name,
            patient.age,
            patient.blood_group,
            coords,
            time_label(now),
            map_link,
            facility.name,
            facility.latitude,
            facility.longitude,
            facility.eta_minutes,
            facility.dispatch_phone,
        );
        let facility_record = self.deliver(NotificationRecord {
            recipient_kind: RecipientKind::Facility,
            recipient_name: facility.name.clone(),
            recipient_phone: facility.dispatch_phone.clone(),
            status: DeliveryStatus::Pending,
            message_body: body,
            composed_at: now,
        });
        let facility_sent = facility_record.status == DeliveryStatus::Sent;
        records.insert(RecipientSlot::Facility, facility_record);

        // ── Inbox handoff ────────────────────────────────────────────────────
        let mut inbox_error = None;
        let alert = if facility_sent {
            let alert = DispatchedAlert {
                alert_id: uuid::Uuid::new_v4(),
                session_id: request.session_id.to_string(),
                patient_name: patient.name.clone(),
                patient_phone: patient.phone.clone(),
                patient_position: request.position.clone(),
                map_link,
                facility_name: facility.name.clone(),
                facility_position: facility.point(),
                facility_phone: facility.dispatch_phone.clone(),
                dispatched_at: now,
            };
            match self.alerts.append(&alert) {
                Ok(()) => {
                    debug!(alert_id = %alert.alert_id, facility = %facility.name, "alert appended to inbox");
                    Some(alert)
                }
                Err(e) => {
                    warn!(facility = %facility.name, error = %e, "facility alert sent but not recorded in inbox");
                    inbox_error = Some(e);
                    None
                }
            }
        } else {
            warn!(facility = %facility.name, "facility alert not delivered, inbox left unchanged");
            None
        };

        DispatchReport {
            records,
            alert,
            inbox_error,
        }
    }

    fn deliver(&self, mut record: NotificationRecord) -> NotificationRecord {
        record.status = match self.gateway.deliver(&record) {
            Ok(()) => DeliveryStatus::Sent,
            Err(e) => {
                warn!(to = %record.recipient_name, error = %e, "alert delivery failed");
                DeliveryStatus::Failed
            }
        };
        record
    }
}

/// Patient fields with the defaults messages show when no profile exists.
struct PatientSummary {
    name: String,
    age: String,
    blood_group: String,
    phone: String,
}

impl PatientSummary {
    fn from_profile(profile: Option<&Profile>) -> Self {
        let non_blank = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Self {
            name: profile
                .and_then(|p| non_blank(&p.name))
                .unwrap_or_else(|| "Unknown".to_string()),
            age: profile
                .filter(|p| p.age > 0)
                .map(|p| p.age.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            blood_group: profile
                .and_then(|p| non_blank(&p.blood_group))
                .unwrap_or_else(|| "N/A".to_string()),
            phone: profile
                .and_then(|p| non_blank(&p.phone))
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

fn time_label(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S UTC").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
