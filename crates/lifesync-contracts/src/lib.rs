//! # lifesync-contracts
//!
//! Shared types and error contracts for the LifeSync emergency dispatch
//! engine.
//!
//! All crates in the workspace import from here. Apart from small helpers
//! (contact padding, coordinate formatting) no business logic lives in this
//! crate.

pub mod error;
pub mod facility;
pub mod notification;
pub mod position;
pub mod profile;
pub mod session;
pub mod validate;
