//! Deterministic walking-pace position generator.

use super::{PositionSource, SourceError};
use crate::geo::GeoPoint;
use crate::time::now_ms;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Emits a steadily drifting track from a starting coordinate.
///
/// Each sample moves roughly 1.4 m/s north-east (a brisk walk), well under
/// the outlier filter's speed ceiling.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    start_latitude: f64,
    start_longitude: f64,
    interval: Duration,
}

// Approx. meters-to-degrees at mid latitudes.
const DEGREES_PER_METER: f64 = 1.0 / 111_320.0;
const WALK_SPEED_MPS: f64 = 1.4;

impl SimulatedSource {
    pub fn new(start_latitude: f64, start_longitude: f64, interval: Duration) -> Self {
        Self {
            start_latitude,
            start_longitude,
            interval,
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(51.5074, -0.1278, Duration::from_secs(1))
    }
}

impl PositionSource for SimulatedSource {
    fn watch(&self, cancel: CancellationToken) -> Result<mpsc::Receiver<GeoPoint>, SourceError> {
        let (tx, rx) = mpsc::channel(32);
        let interval = self.interval;
        let step_deg = WALK_SPEED_MPS * interval.as_secs_f64() * DEGREES_PER_METER;
        let mut latitude = self.start_latitude;
        let mut longitude = self.start_longitude;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("Simulated source stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        latitude += step_deg;
                        longitude += step_deg;
                        let point = match GeoPoint::new(latitude, longitude, now_ms(), None, Some(5.0)) {
                            Ok(p) => p,
                            // Walked off the edge of the map; stop the track.
                            Err(_) => break,
                        };
                        if tx.send(point).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{accept, OutlierFilterConfig};

    #[tokio::test]
    async fn test_emits_points_until_cancelled() {
        let source = SimulatedSource::new(51.5, -0.12, Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let mut rx = source.watch(cancel.clone()).unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.latitude > first.latitude);

        cancel.cancel();
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_track_passes_outlier_filter() {
        let source = SimulatedSource::new(51.5, -0.12, Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let mut rx = source.watch(cancel.clone()).unwrap();
        let config = OutlierFilterConfig::default();

        let mut last: Option<GeoPoint> = None;
        for _ in 0..5 {
            let point = rx.recv().await.unwrap();
            // Ticks landing in the same millisecond have no defined speed.
            if last.map(|p| p.timestamp_ms) == Some(point.timestamp_ms) {
                continue;
            }
            assert!(accept(&point, last.as_ref(), &config));
            last = Some(point);
        }
        cancel.cancel();
    }
}
