//! The position sample value type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing a [`GeoPoint`].
#[derive(Debug, Error, PartialEq)]
pub enum GeoPointError {
    /// Latitude outside [-90, 90]
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180]
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A single position sample.
///
/// Immutable once created: the pipeline only ever copies points, never
/// mutates them. Timestamps are wall-clock epoch milliseconds as reported
/// by the position source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in decimal degrees, [-180, 180].
    pub longitude: f64,
    /// Wall-clock timestamp in epoch milliseconds.
    pub timestamp_ms: i64,
    /// Elevation in meters above sea level, if the source reports it.
    pub elevation: Option<f64>,
    /// Horizontal accuracy in meters, if the source reports it.
    pub accuracy: Option<f64>,
}

impl GeoPoint {
    /// Create a validated position sample.
    ///
    /// # Errors
    ///
    /// Returns an error if latitude or longitude is outside its valid range.
    pub fn new(
        latitude: f64,
        longitude: f64,
        timestamp_ms: i64,
        elevation: Option<f64>,
        accuracy: Option<f64>,
    ) -> Result<Self, GeoPointError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            timestamp_ms,
            elevation,
            accuracy,
        })
    }
}
