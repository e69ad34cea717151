//! Collaborator traits for the LifeSync dispatch engine.
//!
//! The engine reaches every external capability through one of these
//! seams:
//!
//! - `LocationProvider`: device positioning (one-shot + watch)
//! - `PlaceSearch`: nearby facility discovery
//! - `CapacityFeed`: per-facility capacity figures
//! - `MessageGateway`: alert delivery to a recipient
//! - `TelephonyLauncher`: fire-and-forget call placement
//! - `KeyValueStore`: persistence surviving restarts
//! - `AlertLog`: the shared facility inbox
//! - `RecordValidator`: registration record checks
//! - `ResendPrompt`: user confirmation before a repeat dispatch
//!
//! The async seams return `impl Future` and are used generically; the
//! synchronous ones are held as trait objects.

use std::future::Future;

use tokio::sync::mpsc;

use lifesync_contracts::{
    error::LifeSyncResult,
    facility::SimulatedCapacity,
    notification::{DispatchedAlert, NotificationRecord},
    position::{FixOptions, GeoPoint, Position},
    profile::{FacilityAccount, Profile},
    validate::ValidationReport,
};

/// Device location capability.
pub trait LocationProvider: Send + Sync + 'static {
    /// Obtain a single fix honoring `options`.
    ///
    /// Implementations report permission or capability problems as
    /// `LifeSyncError::LocationUnavailable`. The caller also enforces
    /// `options.timeout` on its side.
    fn get_once(
        &self,
        options: FixOptions,
    ) -> impl Future<Output = LifeSyncResult<Position>> + Send;

    /// Start a continuous watch.
    ///
    /// Readings arrive on the returned channel until the receiver is
    /// dropped, which cancels the watch on the provider side.
    fn watch(&self, options: FixOptions) -> LifeSyncResult<mpsc::Receiver<Position>>;
}

/// A nearby-place query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
    pub center: GeoPoint,
    pub radius_m: u32,
    pub category: String,
}

/// Status code returned by the place-search capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownError => "UNKNOWN_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// One place reported by the search capability.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceResult {
    pub place_id: Option<String>,
    pub name: String,
    pub vicinity: Option<String>,
    pub location: GeoPoint,
    pub rating: Option<f32>,
    pub open_now: Option<bool>,
}

/// The full reply to a `PlaceQuery`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceResponse {
    pub status: SearchStatus,
    pub results: Vec<PlaceResult>,
}

/// External place-search capability.
///
/// The capability may load lazily; the ranker polls `is_ready()` for a
/// bounded time before giving up on it.
pub trait PlaceSearch: Send + Sync + 'static {
    /// True once `nearby()` can be called.
    fn is_ready(&self) -> bool;

    fn nearby(&self, query: &PlaceQuery) -> impl Future<Output = PlaceResponse> + Send;
}

/// Source of capacity figures for live candidates.
///
/// No real capacity feed exists; implementations return simulated values.
pub trait CapacityFeed: Send + Sync {
    fn capacity_for(&self, place: &PlaceResult) -> SimulatedCapacity;
}

/// Delivers a composed alert to its recipient.
pub trait MessageGateway: Send + Sync {
    /// Returns `LifeSyncError::DeliveryFailed` when the message is refused.
    fn deliver(&self, record: &NotificationRecord) -> LifeSyncResult<()>;
}

/// Places a phone call. Fire-and-forget: not awaited, not retried.
pub trait TelephonyLauncher: Send + Sync {
    fn place_call(&self, number: &str);
}

/// Text key/value persistence surviving process restarts.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> LifeSyncResult<Option<String>>;

    fn write(&self, key: &str, value: &str) -> LifeSyncResult<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> LifeSyncResult<()>;

    /// Atomically replace the value at `key` with `f(current)`.
    ///
    /// No other write to the same store may interleave between the read and
    /// the write. Returns the value written.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> LifeSyncResult<String>,
    ) -> LifeSyncResult<String>;
}

/// The shared, bounded, newest-first log of dispatched alerts.
pub trait AlertLog: Send + Sync {
    /// Add `alert` as the newest entry.
    fn append(&self, alert: &DispatchedAlert) -> LifeSyncResult<()>;

    /// Current entries, newest first.
    fn list(&self) -> LifeSyncResult<Vec<DispatchedAlert>>;
}

/// Checks registration records before they are persisted.
pub trait RecordValidator: Send + Sync {
    fn validate_profile(&self, profile: &Profile) -> LifeSyncResult<ValidationReport>;

    fn validate_facility(&self, account: &FacilityAccount) -> LifeSyncResult<ValidationReport>;
}

/// What the user answered when asked to resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDecision {
    Confirm,
    Decline,
}

/// Details shown to the user before a repeat dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResendRequest {
    pub session_id: String,
    pub facility_name: String,
    /// Records already sent in this session.
    pub prior_records: usize,
}

/// Asks the user to confirm a repeat dispatch within one session.
pub trait ResendPrompt: Send + Sync {
    fn confirm_resend(&self, request: &ResendRequest) -> ResendDecision;
}
