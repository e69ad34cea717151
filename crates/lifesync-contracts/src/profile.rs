//! Citizen profile, emergency contacts and facility accounts.
//!
//! A `Profile` is created at registration and replaced wholesale on edit.
//! A `FacilityAccount` is created once at facility registration.

use serde::{Deserialize, Serialize};

/// Number of contact slots every fan-out targets.
pub const DEFAULT_CONTACT_SLOTS: usize = 5;

/// A person to alert when the citizen triggers an SOS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub display_name: String,
    pub phone_number: String,
}

impl EmergencyContact {
    pub fn new(display_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            phone_number: phone_number.into(),
        }
    }

    /// Deterministic placeholder for slot `index` (0-based).
    ///
    /// Slot 2 yields `Contact 3` / `+91 90000 00002`; the last group is
    /// always five digits.
    pub fn placeholder(index: usize) -> Self {
        Self {
            display_name: format!("Contact {}", index + 1),
            phone_number: format!("+91 90000 {:05}", index % 100_000),
        }
    }

    fn is_usable(&self) -> bool {
        !self.display_name.trim().is_empty() && !self.phone_number.trim().is_empty()
    }
}

/// The citizen's medical and contact profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub blood_group: String,
    pub phone: String,
    pub email: String,
    /// Ordered; the first entries fill the first fan-out slots.
    pub contacts: Vec<EmergencyContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Profile {
    /// Contacts padded with placeholders to exactly `slots` entries.
    pub fn emergency_contacts(&self, slots: usize) -> Vec<EmergencyContact> {
        emergency_contacts(Some(self), slots)
    }
}

/// Build the fixed-size contact list a fan-out targets.
///
/// Registered contacts with both a name and a phone come first, in order.
/// Remaining slots are filled with `EmergencyContact::placeholder`, numbered
/// by slot position, so the result always has exactly `slots` entries.
pub fn emergency_contacts(profile: Option<&Profile>, slots: usize) -> Vec<EmergencyContact> {
    let mut contacts: Vec<EmergencyContact> = profile
        .map(|p| {
            p.contacts
                .iter()
                .filter(|c| c.is_usable())
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    contacts.truncate(slots);
    while contacts.len() < slots {
        contacts.push(EmergencyContact::placeholder(contacts.len()));
    }
    contacts
}

/// Which party a login belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Citizen,
    Facility,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Citizen => write!(f, "citizen"),
            Self::Facility => write!(f, "facility"),
        }
    }
}

/// A receiving facility's account.
///
/// `credential_secret` is compared verbatim at login; no hardening is
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityAccount {
    pub facility_name: String,
    pub contact_person: String,
    pub contact_number: String,
    pub email: String,
    pub credential_secret: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub dispatch_driver_number: String,
}

impl FacilityAccount {
    /// Plain equality check of name and secret.
    pub fn matches_login(&self, facility_name: &str, secret: &str) -> bool {
        self.facility_name == facility_name && self.credential_secret == secret
    }
}
