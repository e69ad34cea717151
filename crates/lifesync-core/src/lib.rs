//! # lifesync-core
//!
//! The emergency dispatch engine for LifeSync.
//!
//! This crate provides:
//! - The collaborator traits the engine reaches the outside world through
//! - `PositionTracker`, `FacilityRanker` and `NotificationFanOut`
//! - `SosEngine`, the session state machine wiring them together
//! - Typed record access and the account service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lifesync_core::{SosEngine, traits::{LocationProvider, PlaceSearch}};
//! ```

pub mod accounts;
pub mod capacity;
pub mod engine;
pub mod fanout;
pub mod geo;
pub mod maplink;
pub mod ranker;
pub mod records;
pub mod tracker;
pub mod traits;

#[cfg(test)]
mod testing;

pub use accounts::{AccountService, LoginOutcome};
pub use capacity::{FixedCapacityFeed, RandomCapacityFeed};
pub use engine::{DispatchOutcome, SosEngine};
pub use fanout::{DispatchReport, DispatchRequest, LoggingGateway, NotificationFanOut};
pub use maplink::MapLinkFormatter;
pub use ranker::FacilityRanker;
pub use records::RecordStore;
pub use tracker::PositionTracker;
