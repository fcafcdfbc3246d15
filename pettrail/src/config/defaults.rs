//! Default values for all configuration settings.

use std::path::PathBuf;

/// Default base URL of the walk ingestion API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default points per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default seconds between time-based flushes.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;

/// Default outlier filter speed ceiling in m/s.
pub const DEFAULT_MAX_SPEED_MPS: f64 = 50.0;

/// Default maximum accepted accuracy radius in meters.
pub const DEFAULT_MAX_ACCURACY_M: f64 = 100.0;

/// Default retryable attempts before dropping a batch.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default backoff base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 5_000;

/// Default backoff delay ceiling in milliseconds.
pub const DEFAULT_CAP_DELAY_MS: u64 = 60_000;

/// Default backoff jitter in milliseconds.
pub const DEFAULT_JITTER_MS: u64 = 1_000;

/// Default seconds granted to the final drain during a normal stop.
pub const DEFAULT_STOP_DRAIN_TIMEOUT_SECS: u64 = 5;

/// Default path of the SQLite batch store (~/.pettrail/queue.db).
pub fn default_queue_path() -> PathBuf {
    super::file::config_directory().join("queue.db")
}
