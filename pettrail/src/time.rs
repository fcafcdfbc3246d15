//! Time-related utility functions.
//!
//! The queue and wire formats use epoch milliseconds; this module provides
//! the conversions between that representation, `SystemTime`, and the
//! RFC 3339 strings the ingestion endpoint expects.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Convert epoch milliseconds to an RFC 3339 timestamp string.
///
/// Out-of-range values fall back to the Unix epoch rather than panicking;
/// the ingestion service rejects such points during validation anyway.
pub fn ms_to_rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
