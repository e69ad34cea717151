//! Wiring: one simulated citizen device plus the shared inbox.

use std::sync::Arc;

use lifesync_config::EngineConfig;
use lifesync_core::{
    traits::{CapacityFeed, KeyValueStore, PlaceSearch},
    AccountService, FacilityRanker, MapLinkFormatter, NotificationFanOut, PositionTracker,
    RandomCapacityFeed, RecordStore, SosEngine,
};
use lifesync_store::AlertInbox;
use lifesync_validate::SchemaValidator;

use crate::devices::SimulatedLocation;
use crate::recorders::{RecordingGateway, RecordingTelephony, ScriptedPrompt};

/// An engine with every collaborator it talks to kept inspectable.
pub struct SimWorld<P: PlaceSearch> {
    pub engine: SosEngine<SimulatedLocation, P>,
    pub accounts: AccountService,
    pub inbox: Arc<AlertInbox>,
    pub gateway: Arc<RecordingGateway>,
    pub telephony: Arc<RecordingTelephony>,
    pub prompt: Arc<ScriptedPrompt>,
    pub places: Arc<P>,
}

pub struct WorldBuilder {
    config: EngineConfig,
    kv: Arc<dyn KeyValueStore>,
    capacity: Arc<dyn CapacityFeed>,
    gateway: RecordingGateway,
    prompt: ScriptedPrompt,
}

impl WorldBuilder {
    pub fn new(config: EngineConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            kv,
            capacity: Arc::new(RandomCapacityFeed::default()),
            gateway: RecordingGateway::default(),
            prompt: ScriptedPrompt::default(),
        }
    }

    pub fn capacity(mut self, capacity: Arc<dyn CapacityFeed>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn gateway(mut self, gateway: RecordingGateway) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn prompt(mut self, prompt: ScriptedPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn build<P: PlaceSearch>(self, location: SimulatedLocation, places: P) -> SimWorld<P> {
        let config = self.config;
        let records = RecordStore::new(self.kv.clone());
        let inbox = Arc::new(AlertInbox::new(self.kv, config.inbox.capacity));
        let gateway = Arc::new(self.gateway);
        let telephony = Arc::new(RecordingTelephony::default());
        let prompt = Arc::new(self.prompt);
        let places = Arc::new(places);

        let engine = SosEngine::new(
            PositionTracker::new(Arc::new(location), config.location.clone()),
            FacilityRanker::new(places.clone(), self.capacity, config.discovery.clone()),
            NotificationFanOut::new(
                gateway.clone(),
                MapLinkFormatter::from_settings(&config.maps),
                config.fanout.contact_slots,
                inbox.clone(),
            ),
            records.clone(),
            telephony.clone(),
            prompt.clone(),
            config.fanout.clone(),
        );

        SimWorld {
            engine,
            accounts: AccountService::new(records, Arc::new(SchemaValidator::default())),
            inbox,
            gateway,
            telephony,
            prompt,
            places,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lifesync_config::EngineConfig;
    use lifesync_contracts::{
        error::LifeSyncError,
        facility::Provenance,
        notification::DeliveryStatus,
        session::SessionState,
    };
    use lifesync_core::{
        traits::{AlertLog, SearchStatus},
        DispatchOutcome, FixedCapacityFeed,
    };
    use lifesync_store::MemoryStore;

    use super::WorldBuilder;
    use crate::devices::{SimulatedLocation, SimulatedPlaces};
    use crate::mock_data::{nearby_places, CITIZEN_POSITION};
    use crate::recorders::RecordingGateway;

    fn builder() -> WorldBuilder {
        WorldBuilder::new(EngineConfig::default(), Arc::new(MemoryStore::new()))
    }

    // ── Location ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn denied_location_leaves_session_idle() {
        let world = builder().build(SimulatedLocation::denied(), SimulatedPlaces::never_ready());

        let err = world.engine.start_sos().await.unwrap_err();
        assert!(matches!(err, LifeSyncError::LocationUnavailable { .. }));
        assert_eq!(world.engine.snapshot().unwrap().state, SessionState::Idle);
        assert!(!world.engine.is_tracking());
    }

    // ── Discovery ─────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn refused_query_falls_back() {
        let world = builder().build(
            SimulatedLocation::at(CITIZEN_POSITION),
            SimulatedPlaces::failing(SearchStatus::OverQueryLimit),
        );

        let snapshot = world.engine.start_sos().await.unwrap();
        assert_eq!(snapshot.provenance(), Some(Provenance::Fallback));
        assert_eq!(world.places.readiness_checks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_feed_fills_live_candidates() {
        let world = builder()
            .capacity(Arc::new(FixedCapacityFeed(7)))
            .build(SimulatedLocation::at(CITIZEN_POSITION), SimulatedPlaces::live(nearby_places(), 0));

        let snapshot = world.engine.start_sos().await.unwrap();
        let ranked = snapshot.ranked.unwrap();
        assert_eq!(ranked.provenance, Provenance::Live);
        assert!(ranked.facilities.iter().all(|f| f.capacity.icu_beds == 7));
    }

    // ── Delivery ──────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn unreachable_facility_skips_inbox_and_call() {
        let world = builder()
            .gateway(RecordingGateway::with_unreachable(vec!["+91 98765 10001".to_string()]))
            .build(SimulatedLocation::at(CITIZEN_POSITION), SimulatedPlaces::never_ready());
        world.engine.start_sos().await.unwrap();

        let DispatchOutcome::Dispatched { report, .. } =
            world.engine.confirm_and_dispatch("fallback-1").unwrap()
        else {
            panic!("first dispatch should not prompt");
        };

        assert_eq!(report.facility_record().unwrap().status, DeliveryStatus::Failed);
        assert_eq!(report.count_with(DeliveryStatus::Sent), 5);
        assert!(report.alert.is_none());
        assert!(world.inbox.list().unwrap().is_empty());
        assert!(world.telephony.calls().is_empty());
        assert_eq!(world.gateway.delivered().len(), 5);
    }
}
