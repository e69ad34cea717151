//! Position tracking: one-shot fixes and a single continuous watch.
//!
//! The tracker owns at most one watch at a time. Each watch runs as a
//! spawned task that forwards normalized readings to a callback until its
//! cancellation token fires or the provider closes the channel.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lifesync_config::LocationSettings;
use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    position::{FixOptions, Position},
};

use crate::traits::LocationProvider;

struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Wraps a `LocationProvider` with timeouts and watch bookkeeping.
pub struct PositionTracker<L: LocationProvider> {
    provider: Arc<L>,
    settings: LocationSettings,
    watch: Mutex<Option<WatchHandle>>,
}

impl<L: LocationProvider> PositionTracker<L> {
    pub fn new(provider: Arc<L>, settings: LocationSettings) -> Self {
        Self {
            provider,
            settings,
            watch: Mutex::new(None),
        }
    }

    /// Obtain one fresh, high-accuracy fix.
    ///
    /// Fails with `LocationUnavailable` when the provider refuses or does
    /// not answer within the configured fix timeout.
    pub async fn acquire(&self) -> LifeSyncResult<Position> {
        let options = FixOptions::one_shot(self.settings.fix_timeout());

        match tokio::time::timeout(options.timeout, self.provider.get_once(options)).await {
            Ok(Ok(position)) => {
                let position = position.normalized();
                debug!(
                    lat = format!("{:.5}", position.latitude),
                    lon = format!("{:.5}", position.longitude),
                    accuracy_m = format!("{:.0}", position.accuracy_meters),
                    "one-shot fix acquired"
                );
                Ok(position)
            }
            Ok(Err(LifeSyncError::LocationUnavailable { reason })) => {
                warn!(%reason, "one-shot fix failed");
                Err(LifeSyncError::LocationUnavailable { reason })
            }
            Ok(Err(other)) => {
                warn!(error = %other, "location provider error");
                Err(LifeSyncError::LocationUnavailable {
                    reason: other.to_string(),
                })
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.fix_timeout_ms,
                    "one-shot fix timed out"
                );
                Err(LifeSyncError::LocationUnavailable {
                    reason: format!("no fix within {} ms", self.settings.fix_timeout_ms),
                })
            }
        }
    }

    /// Start the continuous low-power watch.
    ///
    /// Each reading is normalized and handed to `on_update`. Only one watch
    /// may exist; call `stop_tracking()` first to replace it.
    pub fn track<F>(&self, on_update: F) -> LifeSyncResult<()>
    where
        F: Fn(Position) + Send + 'static,
    {
        let mut slot = self.watch.lock().map_err(|e| LifeSyncError::InvalidTransition {
            from: format!("poisoned tracker ({})", e),
            event: "track".to_string(),
        })?;

        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Err(LifeSyncError::InvalidTransition {
                from: "tracking".to_string(),
                event: "start a second watch".to_string(),
            });
        }

        let options = FixOptions::watch(self.settings.watch_max_age(), self.settings.fix_timeout());
        let mut rx = self.provider.watch(options)?;

        let cancel = CancellationToken::new();
        let cancelled = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        debug!("position watch cancelled");
                        break;
                    }
                    update = rx.recv() => match update {
                        Some(position) => on_update(position.normalized()),
                        None => {
                            debug!("position watch channel closed");
                            break;
                        }
                    },
                }
            }
        });

        info!(
            max_age_ms = self.settings.watch_max_age_ms,
            "position watch started"
        );
        *slot = Some(WatchHandle { cancel, task });
        Ok(())
    }

    /// Cancel the active watch, if any.
    ///
    /// Safe to call any number of times. Returns true if a watch was
    /// actually stopped.
    pub fn stop_tracking(&self) -> bool {
        let handle = match self.watch.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match handle {
            Some(h) => {
                h.cancel.cancel();
                info!("position watch stopped");
                true
            }
            None => false,
        }
    }

    /// True while a watch task is running.
    pub fn is_tracking(&self) -> bool {
        self.watch
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.task.is_finished()))
            .unwrap_or(false)
    }
}

impl<L: LocationProvider> Drop for PositionTracker<L> {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use lifesync_config::LocationSettings;
    use lifesync_contracts::{
        error::{LifeSyncError, LifeSyncResult},
        position::{FixOptions, Position},
    };

    use super::PositionTracker;
    use crate::traits::LocationProvider;

    /// A provider whose one-shot answer and watch channel are scripted.
    struct ScriptedProvider {
        fix: Mutex<Option<LifeSyncResult<Position>>>,
        hang: bool,
        watch_tx: Mutex<Option<mpsc::Sender<Position>>>,
        watch_options: Mutex<Vec<FixOptions>>,
    }

    impl ScriptedProvider {
        fn new(fix: LifeSyncResult<Position>) -> Self {
            Self {
                fix: Mutex::new(Some(fix)),
                hang: false,
                watch_tx: Mutex::new(None),
                watch_options: Mutex::new(vec![]),
            }
        }

        fn hanging() -> Self {
            Self { hang: true, ..Self::new(Ok(Position::new(0.0, 0.0, 1.0))) }
        }

        fn sender(&self) -> mpsc::Sender<Position> {
            self.watch_tx.lock().unwrap().clone().expect("watch not started")
        }
    }

    impl LocationProvider for ScriptedProvider {
        async fn get_once(&self, _options: FixOptions) -> LifeSyncResult<Position> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.fix
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(LifeSyncError::LocationUnavailable { reason: "used".into() }))
        }

        fn watch(&self, options: FixOptions) -> LifeSyncResult<mpsc::Receiver<Position>> {
            let (tx, rx) = mpsc::channel(8);
            *self.watch_tx.lock().unwrap() = Some(tx);
            self.watch_options.lock().unwrap().push(options);
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn acquire_returns_normalized_fix() {
        let provider = Arc::new(ScriptedProvider::new(Ok(Position::new(12.97, 77.59, -3.0))));
        let tracker = PositionTracker::new(provider, LocationSettings::default());

        let position = tracker.acquire().await.unwrap();
        assert_eq!(position.latitude, 12.97);
        assert_eq!(position.accuracy_meters, 0.0);
    }

    #[tokio::test]
    async fn acquire_maps_permission_denial() {
        let provider = Arc::new(ScriptedProvider::new(Err(LifeSyncError::LocationUnavailable {
            reason: "permission denied".into(),
        })));
        let tracker = PositionTracker::new(provider, LocationSettings::default());

        match tracker.acquire().await {
            Err(LifeSyncError::LocationUnavailable { reason }) => {
                assert_eq!(reason, "permission denied");
            }
            other => panic!("expected LocationUnavailable, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_times_out_after_fix_timeout() {
        let provider = Arc::new(ScriptedProvider::hanging());
        let tracker = PositionTracker::new(provider, LocationSettings::default());

        let started = tokio::time::Instant::now();
        let result = tracker.acquire().await;

        assert!(matches!(result, Err(LifeSyncError::LocationUnavailable { .. })));
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn watch_forwards_updates_until_stopped() {
        let provider = Arc::new(ScriptedProvider::new(Ok(Position::new(0.0, 0.0, 1.0))));
        let tracker = PositionTracker::new(provider.clone(), LocationSettings::default());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        tracker.track(move |p| sink.lock().unwrap().push(p.latitude)).unwrap();
        assert!(tracker.is_tracking());

        let options = provider.watch_options.lock().unwrap()[0];
        assert!(!options.high_accuracy);
        assert_eq!(options.maximum_age, Duration::from_secs(5));

        let tx = provider.sender();
        tx.send(Position::new(1.0, 1.0, 5.0)).await.unwrap();
        tx.send(Position::new(2.0, 2.0, 5.0)).await.unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(*seen.lock().unwrap(), vec![1.0, 2.0]);

        assert!(tracker.stop_tracking());
        tokio::task::yield_now().await;
        let _ = tx.send(Position::new(3.0, 3.0, 5.0)).await;
        tokio::task::yield_now().await;
        assert_eq!(seen.lock().unwrap().len(), 2, "no updates after stop");
    }

    #[tokio::test]
    async fn second_watch_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new(Ok(Position::new(0.0, 0.0, 1.0))));
        let tracker = PositionTracker::new(provider, LocationSettings::default());

        tracker.track(|_| {}).unwrap();
        let second = tracker.track(|_| {});
        assert!(matches!(second, Err(LifeSyncError::InvalidTransition { .. })));

        // Stop-before-start makes room for a new watch.
        tracker.stop_tracking();
        tracker.track(|_| {}).unwrap();
    }

    #[tokio::test]
    async fn stop_tracking_is_idempotent() {
        let provider = Arc::new(ScriptedProvider::new(Ok(Position::new(0.0, 0.0, 1.0))));
        let tracker = PositionTracker::new(provider, LocationSettings::default());

        assert!(!tracker.stop_tracking());
        tracker.track(|_| {}).unwrap();
        assert!(tracker.stop_tracking());
        assert!(!tracker.stop_tracking());
        assert!(!tracker.stop_tracking());
    }
}
