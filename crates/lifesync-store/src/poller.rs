//! Facility-side inbox polling.
//!
//! There is no push channel between the parties. The facility re-reads the
//! inbox on a fixed interval and republishes the list only when its
//! fingerprint changed, so a consumer sees a new alert at most one interval
//! after it was appended.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lifesync_contracts::notification::DispatchedAlert;
use lifesync_core::traits::AlertLog;

use crate::fingerprint::fingerprint;

/// What the poller last published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxView {
    /// Newest first.
    pub alerts: Vec<DispatchedAlert>,
    /// Empty until the first successful read.
    pub fingerprint: String,
    pub polled_at: Option<DateTime<Utc>>,
}

/// Spawn a task that polls `inbox` every `interval` until `cancellation`
/// fires. The first read happens immediately.
pub fn spawn_inbox_poller(
    inbox: Arc<dyn AlertLog>,
    interval: Duration,
    cancellation: CancellationToken,
) -> (JoinHandle<()>, watch::Receiver<InboxView>) {
    let (tx, rx) = watch::channel(InboxView::default());

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    debug!("inbox poller stopped");
                    break;
                }
                _ = ticker.tick() => poll_once(inbox.as_ref(), &tx),
            }
        }
    });

    (handle, rx)
}

fn poll_once(inbox: &dyn AlertLog, tx: &watch::Sender<InboxView>) {
    let alerts = match inbox.list() {
        Ok(alerts) => alerts,
        Err(e) => {
            warn!(error = %e, "inbox read failed, keeping last view");
            return;
        }
    };
    let fp = match fingerprint(&alerts) {
        Ok(fp) => fp,
        Err(e) => {
            warn!(error = %e, "inbox fingerprint failed");
            return;
        }
    };

    tx.send_if_modified(|view| {
        if view.fingerprint == fp {
            return false;
        }
        debug!(count = alerts.len(), fingerprint = %fp, "inbox changed");
        *view = InboxView {
            alerts,
            fingerprint: fp,
            polled_at: Some(Utc::now()),
        };
        true
    });
}
