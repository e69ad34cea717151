//! # lifesync-store
//!
//! Persistence for LifeSync: `KeyValueStore` implementations, the shared
//! bounded `AlertInbox`, and the facility-side inbox poller.
//!
//! Inbox append protocol:
//!   1. read the whole stored list under the store's update lock
//!   2. prepend the new alert
//!   3. truncate to capacity (oldest dropped)
//!   4. write the whole list back

pub mod fingerprint;
pub mod inbox;
pub mod kv;
pub mod poller;

pub use inbox::{AlertInbox, DEFAULT_INBOX_CAPACITY, INBOX_KEY};
pub use kv::{FileStore, MemoryStore};
pub use poller::{spawn_inbox_poller, InboxView};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    use lifesync_contracts::{
        notification::DispatchedAlert,
        position::{GeoPoint, Position},
    };
    use lifesync_core::traits::{AlertLog, KeyValueStore};

    use super::*;

    fn alert(n: usize) -> DispatchedAlert {
        DispatchedAlert {
            alert_id: uuid::Uuid::new_v4(),
            session_id: format!("session-{n}"),
            patient_name: format!("Patient {n}"),
            patient_phone: "+91 98450 00000".to_string(),
            patient_position: Position::new(12.9716, 77.5946, 10.0),
            map_link: "https://www.google.com/maps?q=12.9716,77.5946".to_string(),
            facility_name: "City General Hospital".to_string(),
            facility_position: GeoPoint::new(12.9816, 77.6026),
            facility_phone: "+91 98765 10001".to_string(),
            dispatched_at: Utc::now(),
        }
    }

    fn memory_inbox(capacity: usize) -> AlertInbox {
        AlertInbox::new(Arc::new(MemoryStore::new()), capacity)
    }

    // ── Inbox ordering and bounds ────────────────────────────────────────────

    #[test]
    fn list_is_newest_first() {
        let inbox = memory_inbox(DEFAULT_INBOX_CAPACITY);
        for n in 0..3 {
            inbox.append(&alert(n)).unwrap();
        }

        let names: Vec<String> = inbox.list().unwrap().into_iter().map(|a| a.patient_name).collect();
        assert_eq!(names, ["Patient 2", "Patient 1", "Patient 0"]);
    }

    #[test]
    fn fifty_first_append_evicts_oldest() {
        let inbox = memory_inbox(DEFAULT_INBOX_CAPACITY);
        for n in 0..50 {
            inbox.append(&alert(n)).unwrap();
        }
        assert_eq!(inbox.list().unwrap().len(), 50);

        inbox.append(&alert(50)).unwrap();

        let list = inbox.list().unwrap();
        assert_eq!(list.len(), 50);
        assert_eq!(list[0].patient_name, "Patient 50");
        assert_eq!(list[49].patient_name, "Patient 1");
        assert!(list.iter().all(|a| a.patient_name != "Patient 0"));
    }

    #[test]
    fn empty_inbox_lists_nothing() {
        assert!(memory_inbox(5).list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_inbox_recovers_on_append() {
        let kv = Arc::new(MemoryStore::new());
        kv.write(INBOX_KEY, "{not json").unwrap();
        let inbox = AlertInbox::new(kv, 5);

        assert!(inbox.list().unwrap().is_empty());
        inbox.append(&alert(1)).unwrap();
        assert_eq!(inbox.list().unwrap().len(), 1);
    }

    // ── File persistence ─────────────────────────────────────────────────────

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            let inbox = AlertInbox::new(Arc::new(store), 50);
            inbox.append(&alert(7)).unwrap();
        }

        let reopened = AlertInbox::new(Arc::new(FileStore::open(dir.path()).unwrap()), 50);
        let list = reopened.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].patient_name, "Patient 7");
        assert!(dir.path().join("facility_alerts.json").exists());
        assert!(!dir.path().join("facility_alerts.json.tmp").exists());
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.write("role", "\"citizen\"").unwrap();
        assert_eq!(store.read("role").unwrap().as_deref(), Some("\"citizen\""));

        store.remove("role").unwrap();
        store.remove("role").unwrap();
        assert!(store.read("role").unwrap().is_none());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(store.write("../escape", "x").is_err());
        assert!(store.read("").is_err());
    }

    // ── Fingerprint ──────────────────────────────────────────────────────────

    #[test]
    fn fingerprint_tracks_content() {
        let a = alert(1);
        let b = alert(2);

        let one = fingerprint::fingerprint(&[a.clone()]).unwrap();
        assert_eq!(one.len(), 64);
        assert_eq!(one, fingerprint::fingerprint(&[a.clone()]).unwrap());
        assert_ne!(one, fingerprint::fingerprint(&[b.clone(), a.clone()]).unwrap());
        assert_ne!(
            fingerprint::fingerprint(&[a.clone(), b.clone()]).unwrap(),
            fingerprint::fingerprint(&[b, a]).unwrap()
        );
    }

    // ── Poller ───────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn poller_publishes_new_alerts_within_one_interval() {
        let inbox = Arc::new(memory_inbox(50));
        let cancel = CancellationToken::new();
        let (handle, mut rx) =
            spawn_inbox_poller(inbox.clone(), Duration::from_secs(2), cancel.clone());

        // First read happens immediately, even for an empty inbox.
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().alerts.is_empty());

        inbox.append(&alert(1)).unwrap();
        let started = tokio::time::Instant::now();
        rx.changed().await.unwrap();
        assert!(started.elapsed() <= Duration::from_secs(2));
        assert_eq!(rx.borrow_and_update().alerts[0].patient_name, "Patient 1");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn poller_skips_unchanged_reads() {
        let inbox = Arc::new(memory_inbox(50));
        inbox.append(&alert(1)).unwrap();
        let cancel = CancellationToken::new();
        let (handle, mut rx) =
            spawn_inbox_poller(inbox.clone(), Duration::from_secs(2), cancel.clone());

        rx.changed().await.unwrap();
        let first = rx.borrow_and_update().clone();
        assert_eq!(first.alerts.len(), 1);

        // Several intervals pass with no new alert.
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(!rx.has_changed().unwrap());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poller_releases_its_timer() {
        let inbox: Arc<dyn AlertLog> = Arc::new(memory_inbox(50));
        let cancel = CancellationToken::new();
        let (handle, _rx) = spawn_inbox_poller(inbox, Duration::from_millis(100), cancel.clone());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop promptly")
            .unwrap();
    }
}
