//! SOS session identity, lifecycle states and the published snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    facility::{Provenance, RankedFacilities},
    notification::{NotificationRecord, RecipientSlot},
    position::Position,
};

/// Unique identifier for one SOS lifecycle, from `start` to `stop`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sub-status of an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveStatus {
    /// Position known; facility search in flight.
    Searching,
    /// Ranked facilities available for display and dispatch.
    Ready,
}

/// Lifecycle state of the citizen's SOS session.
///
/// `stop` from any state returns to `Idle`; there is no resting "stopped"
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    /// Waiting for the one-shot position fix.
    Acquiring,
    Active(ActiveStatus),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Acquiring => write!(f, "acquiring"),
            Self::Active(ActiveStatus::Searching) => write!(f, "active (searching)"),
            Self::Active(ActiveStatus::Ready) => write!(f, "active (ready)"),
        }
    }
}

/// Read-only view of the session, published after every transition.
///
/// The view layer renders from this and never reads engine internals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub state: SessionState,
    pub active_position: Option<Position>,
    pub ranked: Option<RankedFacilities>,
    pub notifications: BTreeMap<RecipientSlot, NotificationRecord>,
    pub already_dispatched: bool,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// True when a facility can be chosen for dispatch.
    pub fn can_dispatch(&self) -> bool {
        self.state == SessionState::Active(ActiveStatus::Ready)
            && self.active_position.is_some()
            && self.ranked.as_ref().is_some_and(|r| !r.facilities.is_empty())
    }

    pub fn provenance(&self) -> Option<Provenance> {
        self.ranked.as_ref().map(|r| r.provenance)
    }
}
