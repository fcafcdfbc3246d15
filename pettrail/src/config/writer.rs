//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[ingest]
; Base URL of the walk ingestion API
base_url = {}
; Timeout in seconds for individual HTTP requests (default: 10)
request_timeout = {}

[sampling]
; Points per batch; a full batch is flushed to the queue immediately (default: 10)
batch_size = {}
; Seconds between time-based flushes of a partial batch (default: 5)
flush_interval = {}
; Maximum plausible speed in m/s; faster implied movement is rejected (default: 50)
max_speed = {}
; Maximum accepted reported accuracy radius in meters (default: 100)
max_accuracy = {}

[queue]
; Path of the SQLite batch store (default: ~/.pettrail/queue.db)
path = {}

[delivery]
; Retryable delivery attempts before a batch is dropped (default: 10)
max_retries = {}
; Base delay in milliseconds for exponential backoff (default: 5000)
base_delay_ms = {}
; Ceiling in milliseconds on the backoff delay (default: 60000)
cap_delay_ms = {}
; Uniform jitter in milliseconds added to each delay (default: 1000)
jitter_ms = {}
; Seconds granted to the final drain during a normal stop (default: 5)
stop_drain_timeout = {}

[logging]
; Directory for log files (default: logs)
directory = {}
; Log file name (default: pettrail.log)
file_name = {}
"#,
        config.ingest.base_url,
        config.ingest.request_timeout_secs,
        config.sampling.batch_size,
        config.sampling.flush_interval_secs,
        config.sampling.max_speed_mps,
        config.sampling.max_accuracy_m,
        config.queue.path.display(),
        config.delivery.max_retries,
        config.delivery.base_delay_ms,
        config.delivery.cap_delay_ms,
        config.delivery.jitter_ms,
        config.delivery.stop_drain_timeout_secs,
        config.logging.directory,
        config.logging.file_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ini::Ini;

    #[test]
    fn test_roundtrip_through_parser() {
        let mut config = ConfigFile::default();
        config.ingest.base_url = "https://walks.example.com/api".to_string();
        config.sampling.batch_size = 25;
        config.delivery.max_retries = 3;

        let ini = Ini::load_from_str(&to_config_string(&config)).unwrap();
        let parsed = super::super::parser::parse_ini(&ini).unwrap();

        assert_eq!(parsed.ingest.base_url, config.ingest.base_url);
        assert_eq!(parsed.sampling.batch_size, 25);
        assert_eq!(parsed.delivery.max_retries, 3);
        assert_eq!(parsed.queue.path, config.queue.path);
    }
}
