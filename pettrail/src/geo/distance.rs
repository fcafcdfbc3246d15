//! Great-circle distance between position samples.

use super::GeoPoint;

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the great-circle distance between two samples in meters.
///
/// Uses the haversine formula, which is accurate over the short distances
/// that matter here (consecutive GPS fixes seconds apart).
pub fn distance_m(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    // Haversine formula
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon, 0, None, None).unwrap()
    }

    #[test]
    fn test_zero_distance() {
        let p = point(48.8566, 2.3522);
        assert!(distance_m(&p, &p).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_latitude() {
        // One degree of latitude is ~111.2 km on the spherical model.
        let a = point(0.0, 0.0);
        let b = point(1.0, 0.0);
        let d = distance_m(&a, &b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_symmetry() {
        let a = point(40.7128, -74.0060);
        let b = point(40.7138, -74.0070);
        assert!((distance_m(&a, &b) - distance_m(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_short_hop() {
        // ~0.0009 degrees latitude is roughly 100 m.
        let a = point(40.0, -74.0);
        let b = point(40.0009, -74.0);
        let d = distance_m(&a, &b);
        assert!((d - 100.0).abs() < 2.0, "got {d}");
    }
}
