//! Typed access to the records kept in the persistent store.
//!
//! Every value is a JSON document under a fixed key. The inbox has its own
//! key and is managed by the inbox, not here.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use lifesync_contracts::{
    error::LifeSyncResult,
    profile::{FacilityAccount, Profile, Role},
};

use crate::traits::KeyValueStore;

pub const ROLE_KEY: &str = "role";
pub const REGISTERED_KEY: &str = "is_registered";
pub const PROFILE_KEY: &str = "user_profile";
pub const FACILITY_ACCOUNT_KEY: &str = "facility_account";
pub const FACILITY_SESSION_KEY: &str = "facility_session";

/// Keys a logout clears.
const LOGIN_STATE_KEYS: [&str; 5] = [
    ROLE_KEY,
    REGISTERED_KEY,
    PROFILE_KEY,
    FACILITY_ACCOUNT_KEY,
    FACILITY_SESSION_KEY,
];

#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn role(&self) -> LifeSyncResult<Option<Role>> {
        self.get(ROLE_KEY)
    }

    pub fn set_role(&self, role: Role) -> LifeSyncResult<()> {
        self.put(ROLE_KEY, &role)
    }

    pub fn is_registered(&self) -> LifeSyncResult<bool> {
        Ok(self.get::<bool>(REGISTERED_KEY)?.unwrap_or(false))
    }

    pub fn set_registered(&self, registered: bool) -> LifeSyncResult<()> {
        self.put(REGISTERED_KEY, &registered)
    }

    pub fn profile(&self) -> LifeSyncResult<Option<Profile>> {
        self.get(PROFILE_KEY)
    }

    pub fn save_profile(&self, profile: &Profile) -> LifeSyncResult<()> {
        self.put(PROFILE_KEY, profile)
    }

    pub fn facility_account(&self) -> LifeSyncResult<Option<FacilityAccount>> {
        self.get(FACILITY_ACCOUNT_KEY)
    }

    pub fn save_facility_account(&self, account: &FacilityAccount) -> LifeSyncResult<()> {
        self.put(FACILITY_ACCOUNT_KEY, account)
    }

    /// Name of the facility currently logged in, if any.
    pub fn facility_session(&self) -> LifeSyncResult<Option<String>> {
        self.get(FACILITY_SESSION_KEY)
    }

    pub fn set_facility_session(&self, facility_name: &str) -> LifeSyncResult<()> {
        self.put(FACILITY_SESSION_KEY, &facility_name)
    }

    /// Remove role, registration, profile and facility-login records.
    pub fn clear_login_state(&self) -> LifeSyncResult<()> {
        for key in LOGIN_STATE_KEYS {
            self.kv.remove(key)?;
        }
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> LifeSyncResult<Option<T>> {
        match self.kv.read(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> LifeSyncResult<()> {
        let text = serde_json::to_string(value)?;
        self.kv.write(key, &text)
    }
}
