//! Wire types for the ingestion API.
//!
//! Field names mirror the service's JSON contract (camelCase); timestamps
//! cross the wire as RFC 3339 strings.

use crate::geo::GeoPoint;
use crate::queue::WalkId;
use crate::time::ms_to_rfc3339;
use serde::{Deserialize, Serialize};

/// A single position sample as submitted to the service.
#[derive(Debug, Clone, Serialize)]
pub struct WirePoint {
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl From<&GeoPoint> for WirePoint {
    fn from(point: &GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            timestamp: ms_to_rfc3339(point.timestamp_ms),
            elevation: point.elevation,
        }
    }
}

/// Request body for `POST /walks/{id}/points`.
#[derive(Debug, Clone, Serialize)]
pub struct PointsBatchRequest {
    pub points: Vec<WirePoint>,
}

impl PointsBatchRequest {
    pub fn from_points(points: &[GeoPoint]) -> Self {
        Self {
            points: points.iter().map(WirePoint::from).collect(),
        }
    }
}

/// Response body for `POST /walks/{id}/points`.
#[derive(Debug, Clone, Deserialize)]
pub struct PointsBatchResponse {
    pub received: u32,
    pub accepted: u32,
    pub discarded: u32,
}

/// Response body for `POST /walks/start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub walk_id: WalkId,
    pub started_at: String,
}

/// Response body for `POST /walks/{id}/stop`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub walk_id: WalkId,
    pub stopped_at: String,
    pub distance: f64,
    pub duration: f64,
    pub average_pace: f64,
    #[serde(default)]
    pub badges: Vec<String>,
}

/// Machine-readable error body carried by non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}
