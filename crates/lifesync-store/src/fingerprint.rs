//! Change detection for the inbox list.
//!
//! The fingerprint is SHA-256 over the canonical JSON of the whole list,
//! hex encoded. Two reads with the same fingerprint hold the same alerts in
//! the same order.

use sha2::{Digest, Sha256};

use lifesync_contracts::{error::LifeSyncResult, notification::DispatchedAlert};

/// Lowercase 64-character hex digest of `alerts`.
pub fn fingerprint(alerts: &[DispatchedAlert]) -> LifeSyncResult<String> {
    let json = serde_json::to_vec(alerts)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(hex::encode(hasher.finalize()))
}
