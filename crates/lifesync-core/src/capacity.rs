//! Simulated capacity figures.
//!
//! There is no live ICU-bed feed. `RandomCapacityFeed` stands behind the
//! `CapacityFeed` seam a real feed would implement, drawing a bounded
//! random value per candidate.

use std::ops::RangeInclusive;

use rand::Rng;

use lifesync_contracts::facility::SimulatedCapacity;

use crate::traits::{CapacityFeed, PlaceResult};

/// Draws ICU-bed counts uniformly from `icu_beds` (default 1..=15).
#[derive(Debug, Clone)]
pub struct RandomCapacityFeed {
    icu_beds: RangeInclusive<u32>,
}

impl RandomCapacityFeed {
    pub fn new(icu_beds: RangeInclusive<u32>) -> Self {
        Self { icu_beds }
    }
}

impl Default for RandomCapacityFeed {
    fn default() -> Self {
        Self::new(1..=15)
    }
}

impl CapacityFeed for RandomCapacityFeed {
    fn capacity_for(&self, _place: &PlaceResult) -> SimulatedCapacity {
        SimulatedCapacity {
            icu_beds: rand::thread_rng().gen_range(self.icu_beds.clone()),
        }
    }
}

/// Returns the same figure for every place.
#[derive(Debug, Clone, Copy)]
pub struct FixedCapacityFeed(pub u32);

impl CapacityFeed for FixedCapacityFeed {
    fn capacity_for(&self, _place: &PlaceResult) -> SimulatedCapacity {
        SimulatedCapacity { icu_beds: self.0 }
    }
}

#[cfg(test)]
mod tests {
    use lifesync_contracts::position::GeoPoint;

    use super::*;

    fn place() -> PlaceResult {
        PlaceResult {
            place_id: None,
            name: "Anywhere".to_string(),
            vicinity: None,
            location: GeoPoint::new(0.0, 0.0),
            rating: None,
            open_now: None,
        }
    }

    #[test]
    fn random_draw_stays_in_bounds() {
        let feed = RandomCapacityFeed::default();
        for _ in 0..200 {
            let beds = feed.capacity_for(&place()).icu_beds;
            assert!((1..=15).contains(&beds), "out of range: {beds}");
        }
    }

    #[test]
    fn fixed_feed_is_constant() {
        assert_eq!(FixedCapacityFeed(7).capacity_for(&place()).icu_beds, 7);
    }
}
