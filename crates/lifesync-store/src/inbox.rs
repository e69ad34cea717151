//! The shared facility alert inbox.
//!
//! A single bounded list stored under one key, newest first. Every append
//! is a read-modify-write of the whole list through `KeyValueStore::update`,
//! so a concurrent reader never sees a partially written list.

use std::sync::Arc;

use tracing::{debug, warn};

use lifesync_contracts::{error::LifeSyncResult, notification::DispatchedAlert};
use lifesync_core::traits::{AlertLog, KeyValueStore};

/// Store key holding the inbox list.
pub const INBOX_KEY: &str = "facility_alerts";

/// Default number of alerts retained.
pub const DEFAULT_INBOX_CAPACITY: usize = 50;

#[derive(Clone)]
pub struct AlertInbox {
    kv: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl AlertInbox {
    pub fn new(kv: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self { kv, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Parse a stored list; unreadable content counts as an empty inbox.
fn decode(text: Option<String>) -> Vec<DispatchedAlert> {
    match text {
        Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, "inbox content unreadable, starting from empty");
            Vec::new()
        }),
        None => Vec::new(),
    }
}

impl AlertLog for AlertInbox {
    fn append(&self, alert: &DispatchedAlert) -> LifeSyncResult<()> {
        let capacity = self.capacity;
        let mut evicted = 0;
        self.kv.update(INBOX_KEY, &mut |current| {
            let mut alerts = decode(current);
            alerts.insert(0, alert.clone());
            evicted = alerts.len().saturating_sub(capacity);
            alerts.truncate(capacity);
            Ok(serde_json::to_string(&alerts)?)
        })?;
        debug!(
            alert_id = %alert.alert_id,
            facility = %alert.facility_name,
            evicted,
            "alert appended to inbox"
        );
        Ok(())
    }

    fn list(&self) -> LifeSyncResult<Vec<DispatchedAlert>> {
        let mut alerts = decode(self.kv.read(INBOX_KEY)?);
        alerts.truncate(self.capacity);
        Ok(alerts)
    }
}
