//! Error types for the LifeSync dispatch engine.
//!
//! All fallible operations return `LifeSyncResult<T>`. The first three
//! variants are the expected, recoverable conditions of an SOS session;
//! the rest report collaborator or configuration problems.

use thiserror::Error;

/// The unified error type for the LifeSync crates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifeSyncError {
    /// No position could be obtained: permission denied, timeout, or no
    /// location capability on the device.
    #[error("location unavailable: {reason}")]
    LocationUnavailable { reason: String },

    /// The place-search capability never became ready or returned nothing
    /// usable. The ranker recovers from this with fallback candidates.
    #[error("facility discovery unavailable: {reason}")]
    DiscoveryUnavailable { reason: String },

    /// A second dispatch was requested in a session that already dispatched.
    #[error("session {session_id} has already dispatched alerts")]
    DispatchDuplicate { session_id: String },

    /// The session state machine was asked for a transition its current
    /// state does not allow.
    #[error("cannot {event} while session is {from}")]
    InvalidTransition { from: String, event: String },

    /// The requested facility is not in the current ranked set.
    #[error("facility '{facility_id}' is not among the ranked facilities")]
    UnknownFacility { facility_id: String },

    /// No notification record exists for the requested recipient slot.
    #[error("no notification recorded for recipient '{slot}'")]
    UnknownRecipient { slot: String },

    /// The message gateway refused a composed alert.
    #[error("delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },

    /// The persistent store could not be read or written.
    #[error("storage failed: {reason}")]
    StorageFailed { reason: String },

    /// A stored value could not be encoded or decoded.
    #[error("serialization failed: {reason}")]
    SerializationFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A registration record failed validation.
    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// Facility login credentials did not match.
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl LifeSyncError {
    /// True for the conditions a session is expected to recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::LocationUnavailable { .. }
                | Self::DiscoveryUnavailable { .. }
                | Self::DispatchDuplicate { .. }
        )
    }
}

impl From<serde_json::Error> for LifeSyncError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationFailed {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the LifeSync crates.
pub type LifeSyncResult<T> = Result<T, LifeSyncError>;
