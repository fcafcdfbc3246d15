//! Retry delay computation.

use super::DrainSettings;
use rand::Rng;

/// Deterministic exponential backoff, capped.
///
/// `retry_count` is the number of failed attempts already made, so the
/// first retry (count 1) waits `base * 2`, doubling until the cap.
pub fn backoff_ms(settings: &DrainSettings, retry_count: u32) -> u64 {
    let multiplier = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
    settings
        .base_delay_ms
        .saturating_mul(multiplier)
        .min(settings.cap_delay_ms)
}

/// Backoff with uniform jitter in `[0, jitter_ms)` to spread reconnect
/// storms after a shared outage.
pub fn backoff_with_jitter_ms(settings: &DrainSettings, retry_count: u32) -> u64 {
    let jitter = if settings.jitter_ms > 0 {
        rand::thread_rng().gen_range(0..settings.jitter_ms)
    } else {
        0
    };
    backoff_ms(settings, retry_count) + jitter
}
