//! # lifesync-sim
//!
//! Simulated collaborators for the LifeSync SOS engine and the end-to-end
//! scenarios built on them.
//!
//! Nothing here touches a real device or network: positions come from a
//! scripted [`devices::SimulatedLocation`], nearby places from
//! [`devices::SimulatedPlaces`], and every message or call is recorded by
//! the types in [`recorders`] so a scenario can print and check it.
//!
//! ## Scenarios
//!
//! | Scenario | What it shows |
//! |---|---|
//! | [`scenarios::fallback_dispatch`] | No contacts, discovery down, fallback candidates |
//! | [`scenarios::repeated_dispatch`] | Resend confirmation, decline keeps state |
//! | [`scenarios::live_search`] | Live ranking and the facility inbox poller |

pub mod devices;
pub mod mock_data;
pub mod recorders;
pub mod scenarios;
pub mod world;

pub use world::{SimWorld, WorldBuilder};
