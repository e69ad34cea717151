//! Per-recipient notification records and dispatched facility alerts.
//!
//! A `NotificationRecord` exists for each recipient of one dispatch attempt.
//! A `DispatchedAlert` is the entry a facility reads from its inbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::position::{GeoPoint, Position};

/// Who a record is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientKind {
    Contact,
    Facility,
}

/// Delivery state of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Composed, not yet handed to the gateway.
    Pending,
    /// Accepted by the message gateway (simulated).
    Sent,
    /// The gateway refused the message.
    Failed,
    /// The user placed a call to this recipient afterwards.
    Called,
}

/// Key of a record within a session's notification map.
///
/// Orders contacts by slot, then the facility last. Serialized as its
/// display string (`contact_0`, `facility`) so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RecipientSlot {
    Contact(usize),
    Facility,
}

impl std::fmt::Display for RecipientSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact(i) => write!(f, "contact_{}", i),
            Self::Facility => write!(f, "facility"),
        }
    }
}

impl From<RecipientSlot> for String {
    fn from(slot: RecipientSlot) -> Self {
        slot.to_string()
    }
}

impl TryFrom<String> for RecipientSlot {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "facility" {
            return Ok(Self::Facility);
        }
        value
            .strip_prefix("contact_")
            .and_then(|i| i.parse::<usize>().ok())
            .map(Self::Contact)
            .ok_or_else(|| format!("unknown recipient slot '{}'", value))
    }
}

/// One composed alert for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub recipient_kind: RecipientKind,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub status: DeliveryStatus,
    pub message_body: String,
    pub composed_at: DateTime<Utc>,
}

/// An alert as it lands in the shared facility inbox.
///
/// Entries are append-only: once written they are only ever dropped by the
/// inbox's bounded eviction, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchedAlert {
    pub alert_id: uuid::Uuid,
    /// The SOS session that produced the alert.
    pub session_id: String,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_position: Position,
    pub map_link: String,
    pub facility_name: String,
    pub facility_position: GeoPoint,
    pub facility_phone: String,
    pub dispatched_at: DateTime<Utc>,
}
