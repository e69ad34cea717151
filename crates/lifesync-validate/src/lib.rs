//! # lifesync-validate
//!
//! Registration record validation for LifeSync.
//!
//! `SchemaValidator` implements `RecordValidator` from `lifesync-core` by
//! serializing the record to JSON and running it through `check_record`
//! against the citizen-profile or facility-account schema.

pub mod engine;
pub mod schemas;

use serde::Serialize;

use lifesync_contracts::{
    error::LifeSyncResult,
    profile::{FacilityAccount, Profile},
    validate::{RecordSchema, ValidationReport},
};
use lifesync_core::traits::RecordValidator;

pub use engine::check_record;
pub use schemas::{citizen_profile_schema, facility_account_schema, BLOOD_GROUPS};

pub struct SchemaValidator {
    profile_schema: RecordSchema,
    facility_schema: RecordSchema,
}

impl SchemaValidator {
    pub fn new(profile_schema: RecordSchema, facility_schema: RecordSchema) -> Self {
        Self {
            profile_schema,
            facility_schema,
        }
    }

    fn check<T: Serialize>(record: &T, schema: &RecordSchema) -> LifeSyncResult<ValidationReport> {
        let value = serde_json::to_value(record)?;
        Ok(check_record(&value, schema))
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(citizen_profile_schema(), facility_account_schema())
    }
}

impl RecordValidator for SchemaValidator {
    fn validate_profile(&self, profile: &Profile) -> LifeSyncResult<ValidationReport> {
        Self::check(profile, &self.profile_schema)
    }

    fn validate_facility(&self, account: &FacilityAccount) -> LifeSyncResult<ValidationReport> {
        Self::check(account, &self.facility_schema)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
