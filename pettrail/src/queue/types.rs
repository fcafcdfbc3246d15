//! Queue value types and errors.

use crate::geo::GeoPoint;
use thiserror::Error;

/// Opaque walk session identifier issued by the ingestion service.
pub type WalkId = i64;

/// Monotonic batch identifier assigned by the durable queue on insert.
pub type BatchId = i64;

/// A persisted group of position samples awaiting delivery.
///
/// Created once by the batcher, then owned exclusively by the queue until
/// removed after successful delivery, terminal failure, or retry exhaustion.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Queue-assigned identifier, unique and monotonically increasing.
    pub id: BatchId,
    /// Session the points belong to.
    pub walk_id: WalkId,
    /// Ordered, non-empty sequence of accepted samples.
    pub points: Vec<GeoPoint>,
    /// Number of failed-but-retryable delivery attempts so far.
    pub retry_count: u32,
    /// Epoch ms before which the batch must not be attempted.
    pub next_attempt_at_ms: i64,
    /// Epoch ms at enqueue time.
    pub created_at_ms: i64,
}

/// Persisted recording session state.
///
/// Invariant: `is_recording == true` implies the walk id and start time
/// describe a live session that should be resumed after a restart.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Active walk session id.
    pub walk_id: WalkId,
    /// Epoch ms the recording started.
    pub started_at_ms: i64,
    /// Whether a recording was in progress when the state was written.
    pub is_recording: bool,
}

/// Errors from durable queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The underlying store rejected the operation.
    #[error("batch store unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem error opening or recreating the store.
    #[error("batch store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Batch no longer exists (e.g., concurrently removed).
    #[error("batch {0} not found")]
    NotFound(BatchId),

    /// Zero-point batches are never enqueued.
    #[error("refusing to enqueue an empty batch")]
    EmptyBatch,

    /// A stored points payload could not be decoded.
    #[error("corrupt batch payload: {0}")]
    Payload(#[from] serde_json::Error),
}
