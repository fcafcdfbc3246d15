//! Outlier rejection for position samples.
//!
//! GPS fixes occasionally jump hundreds of meters due to multipath or a cold
//! receiver. The filter rejects any candidate whose implied speed relative to
//! the last accepted sample is physically implausible, and gates out
//! low-accuracy fixes once a good fix exists.
//!
//! The filter is a pure predicate with no side effects; the caller updates
//! its "last accepted" sample only when a candidate is accepted.

use super::{distance_m, GeoPoint};

/// Configuration for the outlier filter.
#[derive(Debug, Clone, Copy)]
pub struct OutlierFilterConfig {
    /// Maximum plausible speed in meters per second.
    /// Default: 50 m/s (~180 km/h), generous for any walk.
    pub max_speed_mps: f64,
    /// Maximum reported accuracy in meters before a sample is considered
    /// unusable, applied only once a prior accepted fix exists.
    /// Default: 100 m.
    pub max_accuracy_m: f64,
}

impl Default for OutlierFilterConfig {
    fn default() -> Self {
        Self {
            max_speed_mps: 50.0,
            max_accuracy_m: 100.0,
        }
    }
}

/// Speed implied by moving between two samples, in meters per second.
///
/// Returns `f64::INFINITY` when the elapsed time is zero or negative, which
/// callers treat as implausible.
pub fn implied_speed_mps(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let elapsed_s = (to.timestamp_ms - from.timestamp_ms) as f64 / 1000.0;
    if elapsed_s <= 0.0 {
        return f64::INFINITY;
    }
    distance_m(from, to) / elapsed_s
}

/// Decide whether a candidate sample should be accepted.
///
/// Rules, in order:
/// 1. The first fix (no prior accepted sample) is always accepted.
/// 2. Once a prior fix exists, candidates with reported accuracy worse than
///    the threshold are rejected.
/// 3. Candidates implying a speed above `max_speed_mps` relative to the last
///    accepted sample are rejected. Non-positive elapsed time counts as
///    infinite speed.
pub fn accept(
    candidate: &GeoPoint,
    last_accepted: Option<&GeoPoint>,
    config: &OutlierFilterConfig,
) -> bool {
    let Some(prev) = last_accepted else {
        return true;
    };

    if let Some(accuracy) = candidate.accuracy {
        if accuracy > config.max_accuracy_m {
            return false;
        }
    }

    implied_speed_mps(prev, candidate) <= config.max_speed_mps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(lat: f64, lon: f64, timestamp_ms: i64) -> GeoPoint {
        GeoPoint::new(lat, lon, timestamp_ms, None, None).unwrap()
    }

    /// ~100 m north of the given point.
    fn hop_100m(p: &GeoPoint, timestamp_ms: i64) -> GeoPoint {
        point_at(p.latitude + 0.000899, p.longitude, timestamp_ms)
    }

    #[test]
    fn test_first_fix_always_accepted() {
        let cfg = OutlierFilterConfig::default();
        let p = point_at(40.0, -74.0, 1_000);
        assert!(accept(&p, None, &cfg));
    }

    #[test]
    fn test_implausible_speed_rejected() {
        // 100 m in 1 s = 100 m/s > 50 m/s.
        let cfg = OutlierFilterConfig::default();
        let prev = point_at(40.0, -74.0, 1_000);
        let next = hop_100m(&prev, 2_000);
        assert!(!accept(&next, Some(&prev), &cfg));
    }

    #[test]
    fn test_plausible_speed_accepted() {
        // Same 100 m over 10 s = 10 m/s.
        let cfg = OutlierFilterConfig::default();
        let prev = point_at(40.0, -74.0, 1_000);
        let next = hop_100m(&prev, 11_000);
        assert!(accept(&next, Some(&prev), &cfg));
    }

    #[test]
    fn test_zero_elapsed_rejected() {
        let cfg = OutlierFilterConfig::default();
        let prev = point_at(40.0, -74.0, 1_000);
        let next = hop_100m(&prev, 1_000);
        assert!(!accept(&next, Some(&prev), &cfg));
    }

    #[test]
    fn test_poor_accuracy_rejected_with_prior_fix() {
        let cfg = OutlierFilterConfig::default();
        let prev = point_at(40.0, -74.0, 1_000);
        let mut next = point_at(40.00001, -74.0, 61_000);
        next.accuracy = Some(150.0);
        assert!(!accept(&next, Some(&prev), &cfg));
    }

    #[test]
    fn test_poor_accuracy_first_fix_accepted() {
        // Inclusion rule: without a prior fix we take what we can get.
        let cfg = OutlierFilterConfig::default();
        let mut p = point_at(40.0, -74.0, 1_000);
        p.accuracy = Some(500.0);
        assert!(accept(&p, None, &cfg));
    }

    #[test]
    fn test_implied_speed_infinite_on_backwards_time() {
        let prev = point_at(40.0, -74.0, 5_000);
        let next = hop_100m(&prev, 4_000);
        assert!(implied_speed_mps(&prev, &next).is_infinite());
    }
}
