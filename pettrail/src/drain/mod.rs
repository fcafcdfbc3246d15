//! Queue drain engine.
//!
//! The drain engine is the only component that dispatches persisted batches
//! to the ingestion service. It walks the durable queue in ready order,
//! classifies each delivery outcome, and either removes the batch or
//! reschedules it with exponential backoff.
//!
//! A pass is single-flight: triggers that arrive while a pass is running
//! are coalesced into the running pass's loop, never run concurrently.

mod backoff;
mod engine;

pub use backoff::{backoff_ms, backoff_with_jitter_ms};
pub use engine::DrainEngine;

/// Retry policy for the drain engine.
#[derive(Debug, Clone)]
pub struct DrainSettings {
    /// Retryable attempts before a batch is dropped.
    pub max_retries: u32,
    /// Base delay for the exponential backoff schedule.
    pub base_delay_ms: u64,
    /// Upper bound on the deterministic part of the delay.
    pub cap_delay_ms: u64,
    /// Uniform jitter added on top of the deterministic delay.
    pub jitter_ms: u64,
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay_ms: 5_000,
            cap_delay_ms: 60_000,
            jitter_ms: 1_000,
        }
    }
}
