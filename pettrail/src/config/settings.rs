//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use super::defaults::*;
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Ingestion service settings
    pub ingest: IngestSettings,
    /// Sampling and batching settings
    pub sampling: SamplingSettings,
    /// Durable queue settings
    pub queue: QueueSettings,
    /// Delivery retry settings
    pub delivery: DeliverySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            ingest: IngestSettings::default(),
            sampling: SamplingSettings::default(),
            queue: QueueSettings::default(),
            delivery: DeliverySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Ingestion service configuration.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Base URL of the walk ingestion API.
    pub base_url: String,
    /// Timeout in seconds for individual HTTP requests.
    pub request_timeout_secs: u64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Sampling and batching configuration.
#[derive(Debug, Clone)]
pub struct SamplingSettings {
    /// Points per batch before an early flush.
    pub batch_size: usize,
    /// Seconds between time-based flushes of a partial batch.
    pub flush_interval_secs: u64,
    /// Maximum plausible speed in m/s; faster implied movement is rejected.
    pub max_speed_mps: f64,
    /// Maximum accepted reported accuracy radius in meters.
    pub max_accuracy_m: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            max_speed_mps: DEFAULT_MAX_SPEED_MPS,
            max_accuracy_m: DEFAULT_MAX_ACCURACY_M,
        }
    }
}

/// Durable queue configuration.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Path of the SQLite batch store.
    /// Default: ~/.pettrail/queue.db
    pub path: PathBuf,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            path: default_queue_path(),
        }
    }
}

/// Delivery retry configuration.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    /// Retryable attempts before a batch is dropped.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Upper bound in milliseconds on the deterministic backoff delay.
    pub cap_delay_ms: u64,
    /// Uniform jitter in milliseconds added to each delay.
    pub jitter_ms: u64,
    /// Seconds to wait for the final drain during a normal stop.
    pub stop_drain_timeout_secs: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            cap_delay_ms: DEFAULT_CAP_DELAY_MS,
            jitter_ms: DEFAULT_JITTER_MS,
            stop_drain_timeout_secs: DEFAULT_STOP_DRAIN_TIMEOUT_SECS,
        }
    }
}

impl DeliverySettings {
    /// Retry policy slice consumed by the drain engine.
    pub fn drain_settings(&self) -> crate::drain::DrainSettings {
        crate::drain::DrainSettings {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            cap_delay_ms: self.cap_delay_ms,
            jitter_ms: self.jitter_ms,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Directory for log files.
    pub directory: String,
    /// Log file name.
    pub file_name: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: crate::logging::default_log_dir().to_string(),
            file_name: crate::logging::default_log_file().to_string(),
        }
    }
}
