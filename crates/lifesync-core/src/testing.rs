//! Hand-written collaborators shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use tokio::sync::mpsc;

use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    notification::DispatchedAlert,
    position::{FixOptions, Position},
};

use crate::traits::{
    AlertLog, KeyValueStore, LocationProvider, PlaceQuery, PlaceResponse, PlaceSearch,
    ResendDecision, ResendPrompt, ResendRequest, SearchStatus, TelephonyLauncher,
};

// ── Persistence ──────────────────────────────────────────────────────────────

/// When `read_gate` is set, every read waits on it first.
#[derive(Default)]
pub struct MapStore {
    pub values: Mutex<HashMap<String, String>>,
    pub read_gate: Mutex<Option<Arc<Barrier>>>,
}

impl KeyValueStore for MapStore {
    fn read(&self, key: &str) -> LifeSyncResult<Option<String>> {
        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait();
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> LifeSyncResult<()> {
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LifeSyncResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> LifeSyncResult<String>,
    ) -> LifeSyncResult<String> {
        let mut values = self.values.lock().unwrap();
        let next = f(values.get(key).cloned())?;
        values.insert(key.to_string(), next.clone());
        Ok(next)
    }
}

/// Fails the next `failing_appends` appends, then records normally.
#[derive(Default)]
pub struct MemoryLog {
    pub alerts: Arc<Mutex<Vec<DispatchedAlert>>>,
    pub failing_appends: AtomicU32,
}

impl AlertLog for MemoryLog {
    fn append(&self, alert: &DispatchedAlert) -> LifeSyncResult<()> {
        let failing = self
            .failing_appends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LifeSyncError::StorageFailed {
                reason: "disk full".to_string(),
            });
        }
        self.alerts.lock().unwrap().insert(0, alert.clone());
        Ok(())
    }

    fn list(&self) -> LifeSyncResult<Vec<DispatchedAlert>> {
        Ok(self.alerts.lock().unwrap().clone())
    }
}

// ── Device and network ───────────────────────────────────────────────────────

/// One-shot fixes come from `fix` (or hang when `None`); watch readings are
/// pushed by the test through `watch_tx`.
pub struct ScriptedLocation {
    pub fix: Mutex<Option<LifeSyncResult<Position>>>,
    pub watch_tx: Mutex<Option<mpsc::Sender<Position>>>,
    pub watches: AtomicU32,
}

impl ScriptedLocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::with_fix(Some(Ok(Position::new(latitude, longitude, 12.0))))
    }

    pub fn denied() -> Self {
        Self::with_fix(Some(Err(LifeSyncError::LocationUnavailable {
            reason: "permission denied".to_string(),
        })))
    }

    pub fn hanging() -> Self {
        Self::with_fix(None)
    }

    fn with_fix(fix: Option<LifeSyncResult<Position>>) -> Self {
        Self {
            fix: Mutex::new(fix),
            watch_tx: Mutex::new(None),
            watches: AtomicU32::new(0),
        }
    }

    pub fn sender(&self) -> Option<mpsc::Sender<Position>> {
        self.watch_tx.lock().unwrap().clone()
    }
}

impl LocationProvider for ScriptedLocation {
    async fn get_once(&self, _options: FixOptions) -> LifeSyncResult<Position> {
        let fix = match self.fix.lock().unwrap().as_ref() {
            Some(Ok(p)) => Some(Ok(p.clone())),
            Some(Err(e)) => Some(Err(LifeSyncError::LocationUnavailable {
                reason: e.to_string(),
            })),
            None => None,
        };
        match fix {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    fn watch(&self, _options: FixOptions) -> LifeSyncResult<mpsc::Receiver<Position>> {
        let (tx, rx) = mpsc::channel(8);
        *self.watch_tx.lock().unwrap() = Some(tx);
        self.watches.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }
}

/// A place search that never becomes ready.
pub struct DeadPlaces;

impl PlaceSearch for DeadPlaces {
    fn is_ready(&self) -> bool {
        false
    }

    async fn nearby(&self, _query: &PlaceQuery) -> PlaceResponse {
        PlaceResponse {
            status: SearchStatus::UnknownError,
            results: vec![],
        }
    }
}

// ── User-facing collaborators ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPhone {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl TelephonyLauncher for RecordingPhone {
    fn place_call(&self, number: &str) {
        self.calls.lock().unwrap().push(number.to_string());
    }
}

/// Answers every prompt with `decision` and records the requests.
pub struct FixedPrompt {
    pub decision: ResendDecision,
    pub asked: Arc<Mutex<Vec<ResendRequest>>>,
}

impl FixedPrompt {
    pub fn new(decision: ResendDecision) -> Self {
        Self {
            decision,
            asked: Arc::new(Mutex::new(vec![])),
        }
    }
}

impl ResendPrompt for FixedPrompt {
    fn confirm_resend(&self, request: &ResendRequest) -> ResendDecision {
        self.asked.lock().unwrap().push(request.clone());
        self.decision
    }
}
