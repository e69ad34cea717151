//! Login, registration and logout for both parties.

use std::sync::Arc;

use tracing::{info, warn};

use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    profile::{FacilityAccount, Profile, Role},
    validate::ValidationReport,
};

use crate::records::RecordStore;
use crate::traits::RecordValidator;

/// What `login` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    pub role: Role,
    /// A citizen without a stored profile must register first.
    pub needs_registration: bool,
}

pub struct AccountService {
    records: RecordStore,
    validator: Arc<dyn RecordValidator>,
}

impl AccountService {
    pub fn new(records: RecordStore, validator: Arc<dyn RecordValidator>) -> Self {
        Self { records, validator }
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn login(&self, role: Role) -> LifeSyncResult<LoginOutcome> {
        self.records.set_role(role)?;
        let needs_registration = role == Role::Citizen && !self.records.is_registered()?;
        info!(%role, needs_registration, "logged in");
        Ok(LoginOutcome {
            role,
            needs_registration,
        })
    }

    /// Validate and store the citizen profile, replacing any previous one.
    pub fn register_profile(&self, profile: &Profile) -> LifeSyncResult<()> {
        let report = self.validator.validate_profile(profile)?;
        reject_failed("profile", &report)?;
        self.records.save_profile(profile)?;
        self.records.set_registered(true)?;
        info!(name = %profile.name, contacts = profile.contacts.len(), "profile registered");
        Ok(())
    }

    pub fn load_profile(&self) -> LifeSyncResult<Option<Profile>> {
        self.records.profile()
    }

    pub fn register_facility(&self, account: &FacilityAccount) -> LifeSyncResult<()> {
        let report = self.validator.validate_facility(account)?;
        reject_failed("facility account", &report)?;
        self.records.save_facility_account(account)?;
        info!(facility = %account.facility_name, "facility registered");
        Ok(())
    }

    /// Plain equality check against the stored account.
    pub fn facility_login(&self, facility_name: &str, secret: &str) -> LifeSyncResult<FacilityAccount> {
        let account = self
            .records
            .facility_account()?
            .filter(|a| a.matches_login(facility_name, secret))
            .ok_or_else(|| {
                warn!(facility = %facility_name, "facility login rejected");
                LifeSyncError::AuthenticationFailed
            })?;
        self.records.set_role(Role::Facility)?;
        self.records.set_facility_session(&account.facility_name)?;
        info!(facility = %account.facility_name, "facility logged in");
        Ok(account)
    }

    /// Clear login state. The shared inbox is left alone.
    pub fn logout(&self) -> LifeSyncResult<()> {
        self.records.clear_login_state()?;
        info!("logged out");
        Ok(())
    }
}

fn reject_failed(what: &str, report: &ValidationReport) -> LifeSyncResult<()> {
    if report.passed {
        return Ok(());
    }
    warn!(record = what, failures = report.failures.len(), "record rejected");
    Err(LifeSyncError::ValidationFailed {
        reason: format!("{} rejected: {}", what, report.summary()),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lifesync_contracts::{
        error::{LifeSyncError, LifeSyncResult},
        profile::{EmergencyContact, FacilityAccount, Profile, Role},
        validate::{ValidationFailure, ValidationReport},
    };

    use super::AccountService;
    use crate::records::{RecordStore, PROFILE_KEY};
    use crate::testing::MapStore;
    use crate::traits::{KeyValueStore, RecordValidator};

    /// Fails any profile whose name is blank.
    struct NameValidator;

    impl RecordValidator for NameValidator {
        fn validate_profile(&self, profile: &Profile) -> LifeSyncResult<ValidationReport> {
            let failures = if profile.name.trim().is_empty() {
                vec![ValidationFailure {
                    rule_id: "name-required".to_string(),
                    message: "name is required".to_string(),
                }]
            } else {
                vec![]
            };
            Ok(ValidationReport {
                passed: failures.is_empty(),
                failures,
            })
        }

        fn validate_facility(&self, _account: &FacilityAccount) -> LifeSyncResult<ValidationReport> {
            Ok(ValidationReport {
                passed: true,
                failures: vec![],
            })
        }
    }

    fn service() -> (AccountService, Arc<MapStore>) {
        let kv = Arc::new(MapStore::default());
        let svc = AccountService::new(RecordStore::new(kv.clone()), Arc::new(NameValidator));
        (svc, kv)
    }

    fn profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            age: 41,
            blood_group: "O+".to_string(),
            phone: "+91 98450 12345".to_string(),
            email: "k@example.com".to_string(),
            contacts: vec![EmergencyContact::new("Ravi", "+91 99000 11111")],
            profile_picture: None,
            notes: Some("asthma".to_string()),
        }
    }

    fn account() -> FacilityAccount {
        FacilityAccount {
            facility_name: "City General Hospital".to_string(),
            contact_person: "Dr. Iyer".to_string(),
            contact_number: "+91 80 4000 0000".to_string(),
            email: "er@citygeneral.example".to_string(),
            credential_secret: "s3cret".to_string(),
            specialties: vec!["Trauma".to_string()],
            dispatch_driver_number: "+91 98765 10001".to_string(),
        }
    }

    // ── Citizen ──────────────────────────────────────────────────────────────

    #[test]
    fn citizen_login_requires_registration_until_profile_stored() {
        let (svc, _) = service();

        assert!(svc.login(Role::Citizen).unwrap().needs_registration);

        svc.register_profile(&profile("Kiran")).unwrap();
        assert!(!svc.login(Role::Citizen).unwrap().needs_registration);
        assert_eq!(svc.load_profile().unwrap().unwrap().name, "Kiran");
        assert_eq!(svc.records().role().unwrap(), Some(Role::Citizen));
    }

    #[test]
    fn facility_login_never_needs_registration() {
        let (svc, _) = service();
        assert!(!svc.login(Role::Facility).unwrap().needs_registration);
    }

    #[test]
    fn invalid_profile_is_not_stored() {
        let (svc, kv) = service();

        let err = svc.register_profile(&profile("  ")).unwrap_err();

        match err {
            LifeSyncError::ValidationFailed { reason } => {
                assert!(reason.contains("[name-required]"), "got: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(kv.read(PROFILE_KEY).unwrap().is_none());
        assert!(!svc.records().is_registered().unwrap());
    }

    // ── Facility ─────────────────────────────────────────────────────────────

    #[test]
    fn facility_login_checks_name_and_secret() {
        let (svc, _) = service();
        svc.register_facility(&account()).unwrap();

        assert!(matches!(
            svc.facility_login("City General Hospital", "wrong"),
            Err(LifeSyncError::AuthenticationFailed)
        ));
        assert!(matches!(
            svc.facility_login("Other", "s3cret"),
            Err(LifeSyncError::AuthenticationFailed)
        ));

        let logged_in = svc.facility_login("City General Hospital", "s3cret").unwrap();
        assert_eq!(logged_in.dispatch_driver_number, "+91 98765 10001");
        assert_eq!(
            svc.records().facility_session().unwrap().as_deref(),
            Some("City General Hospital")
        );
    }

    #[test]
    fn login_without_account_fails() {
        let (svc, _) = service();
        assert!(matches!(
            svc.facility_login("City General Hospital", "s3cret"),
            Err(LifeSyncError::AuthenticationFailed)
        ));
    }

    // ── Logout ───────────────────────────────────────────────────────────────

    #[test]
    fn logout_clears_login_state_but_not_other_keys() {
        let (svc, kv) = service();
        svc.login(Role::Citizen).unwrap();
        svc.register_profile(&profile("Kiran")).unwrap();
        svc.register_facility(&account()).unwrap();
        kv.write("facility_alerts", "[]").unwrap();

        svc.logout().unwrap();

        assert_eq!(svc.records().role().unwrap(), None);
        assert!(!svc.records().is_registered().unwrap());
        assert!(svc.load_profile().unwrap().is_none());
        assert!(svc.records().facility_account().unwrap().is_none());
        assert_eq!(kv.read("facility_alerts").unwrap().as_deref(), Some("[]"));
    }
}
