//! Great-circle distance and travel-time estimates.

use lifesync_contracts::position::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (haversine).
pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Minutes to cover `distance_km` at a constant `speed_kmh`, rounded up.
///
/// A flat urban-speed simplification, not a routing estimate.
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if speed_kmh <= 0.0 || !distance_km.is_finite() {
        return 0;
    }
    (distance_km / speed_kmh * 60.0).ceil().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(12.9716, 77.5946);
        assert!(distance_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(12.9716, 77.5946);
        let b = GeoPoint::new(13.0358, 77.5970);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn eta_rounds_up_at_thirty_kmh() {
        // 1.2 km at 30 km/h = 2.4 min → 3
        assert_eq!(eta_minutes(1.2, 30.0), 3);
        assert_eq!(eta_minutes(2.6, 30.0), 6);
        assert_eq!(eta_minutes(0.0, 30.0), 0);
    }

    #[test]
    fn eta_with_invalid_speed_is_zero() {
        assert_eq!(eta_minutes(5.0, 0.0), 0);
    }
}
