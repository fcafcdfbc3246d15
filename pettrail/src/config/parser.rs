//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [ingest] section
    if let Some(section) = ini.section(Some("ingest")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.is_empty() {
                config.ingest.base_url = v.to_string();
            }
        }
        if let Some(v) = section.get("request_timeout") {
            config.ingest.request_timeout_secs =
                parse_value(v, "ingest", "request_timeout", "seconds")?;
        }
    }

    // [sampling] section
    if let Some(section) = ini.section(Some("sampling")) {
        if let Some(v) = section.get("batch_size") {
            let size: usize = parse_value(v, "sampling", "batch_size", "points")?;
            if size == 0 {
                return Err(invalid("sampling", "batch_size", v, "must be at least 1"));
            }
            config.sampling.batch_size = size;
        }
        if let Some(v) = section.get("flush_interval") {
            config.sampling.flush_interval_secs =
                parse_value(v, "sampling", "flush_interval", "seconds")?;
        }
        if let Some(v) = section.get("max_speed") {
            let speed: f64 = parse_value(v, "sampling", "max_speed", "m/s")?;
            if speed <= 0.0 {
                return Err(invalid("sampling", "max_speed", v, "must be positive"));
            }
            config.sampling.max_speed_mps = speed;
        }
        if let Some(v) = section.get("max_accuracy") {
            let accuracy: f64 = parse_value(v, "sampling", "max_accuracy", "meters")?;
            if accuracy <= 0.0 {
                return Err(invalid("sampling", "max_accuracy", v, "must be positive"));
            }
            config.sampling.max_accuracy_m = accuracy;
        }
    }

    // [queue] section
    if let Some(section) = ini.section(Some("queue")) {
        if let Some(v) = section.get("path") {
            let v = v.trim();
            if !v.is_empty() {
                config.queue.path = expand_tilde(v);
            }
        }
    }

    // [delivery] section
    if let Some(section) = ini.section(Some("delivery")) {
        if let Some(v) = section.get("max_retries") {
            config.delivery.max_retries = parse_value(v, "delivery", "max_retries", "attempts")?;
        }
        if let Some(v) = section.get("base_delay_ms") {
            config.delivery.base_delay_ms =
                parse_value(v, "delivery", "base_delay_ms", "milliseconds")?;
        }
        if let Some(v) = section.get("cap_delay_ms") {
            config.delivery.cap_delay_ms =
                parse_value(v, "delivery", "cap_delay_ms", "milliseconds")?;
        }
        if let Some(v) = section.get("jitter_ms") {
            config.delivery.jitter_ms = parse_value(v, "delivery", "jitter_ms", "milliseconds")?;
        }
        if let Some(v) = section.get("stop_drain_timeout") {
            config.delivery.stop_drain_timeout_secs =
                parse_value(v, "delivery", "stop_drain_timeout", "seconds")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = v.to_string();
            }
        }
        if let Some(v) = section.get("file_name") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file_name = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    unit: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, &format!("must be a number ({unit})")))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
