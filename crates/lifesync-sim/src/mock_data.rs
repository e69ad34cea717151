//! Fictional people, places and facilities for the simulated scenarios.
//!
//! Nothing here refers to a real person or hospital.

use lifesync_contracts::{
    position::GeoPoint,
    profile::{EmergencyContact, FacilityAccount, Profile},
};
use lifesync_core::traits::PlaceResult;

/// The citizen's position in every scenario (central Bengaluru).
pub const CITIZEN_POSITION: GeoPoint = GeoPoint {
    latitude: 12.9716,
    longitude: 77.5946,
};

// ── Citizens ──────────────────────────────────────────────────────────────────

/// A registered citizen with two emergency contacts.
pub fn registered_profile() -> Profile {
    Profile {
        name: "Asha Rao".to_string(),
        age: 34,
        blood_group: "B+".to_string(),
        phone: "+91 98450 00000".to_string(),
        email: "asha.rao@example.com".to_string(),
        contacts: vec![
            EmergencyContact::new("Ravi Rao", "+91 99000 11111"),
            EmergencyContact::new("Meera Iyer", "+91 99000 22222"),
        ],
        profile_picture: None,
        notes: Some("Penicillin allergy".to_string()),
    }
}

// ── Facilities ────────────────────────────────────────────────────────────────

/// The receiving facility's account.
pub fn facility_account() -> FacilityAccount {
    FacilityAccount {
        facility_name: "Vittal Mallya Road Care".to_string(),
        contact_person: "Dr. Kavya Menon".to_string(),
        contact_number: "+91 80 4000 1000".to_string(),
        email: "er@vmrcare.example".to_string(),
        credential_secret: "triage-42".to_string(),
        specialties: vec!["Emergency".to_string(), "Cardiology".to_string()],
        dispatch_driver_number: "+91 98765 10000".to_string(),
    }
}

fn place(
    id: &str,
    name: &str,
    vicinity: Option<&str>,
    lat: f64,
    lng: f64,
    rating: Option<f32>,
    open_now: Option<bool>,
) -> PlaceResult {
    PlaceResult {
        place_id: Some(id.to_string()),
        name: name.to_string(),
        vicinity: vicinity.map(str::to_string),
        location: GeoPoint::new(lat, lng),
        rating,
        open_now,
    }
}

/// What a live place search returns around `CITIZEN_POSITION`, unsorted.
///
/// Nearest three, in order: Vittal Mallya Road Care, Cubbon Park Trauma
/// Centre, Richmond Road Clinic.
pub fn nearby_places() -> Vec<PlaceResult> {
    vec![
        place("sim-garden", "Garden City Medical", Some("Cunningham Rd"), 12.9880, 77.5920, Some(4.1), Some(true)),
        place("sim-indira", "Indiranagar Care Hospital", Some("100 Feet Rd"), 12.9784, 77.6408, Some(4.4), Some(true)),
        place("sim-richmond", "Richmond Road Clinic", None, 12.9650, 77.6010, None, None),
        place("sim-vmr", "Vittal Mallya Road Care", Some("Vittal Mallya Rd"), 12.9690, 77.5965, Some(4.6), Some(true)),
        place("sim-jayanagar", "Jayanagar General", Some("9th Block"), 12.9250, 77.5938, Some(3.9), Some(false)),
        place("sim-cubbon", "Cubbon Park Trauma Centre", Some("Kasturba Rd"), 12.9763, 77.5929, Some(4.2), Some(false)),
    ]
}
