//! Pipeline event stream.
//!
//! Events are broadcast to any number of subscribers (UI, CLI, tests) over
//! a tokio broadcast channel. Slow subscribers lose old events rather than
//! back-pressuring the pipeline.

use crate::geo::GeoPoint;
use crate::queue::{BatchId, WalkId};

/// High-level recording lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
    /// No session active.
    Idle,
    /// `start_recording` in flight; remote session not yet confirmed.
    Starting,
    /// Session live, samples flowing.
    Recording,
    /// `stop_recording` in flight; sampler stopped, final drain running.
    Stopping,
    /// An interrupted session was found on disk and re-attached.
    Resuming,
}

/// Point-in-time view of pending work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatsSnapshot {
    /// Batches persisted and awaiting delivery.
    pub queued_batches: u64,
    /// Points held in memory, not yet flushed to a batch.
    pub buffered_points: usize,
}

/// Non-fatal delivery outcomes surfaced to observers.
///
/// These describe data loss or session-level conditions the user should
/// know about; none of them aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryNotice {
    /// The service no longer knows the walk; its queued batches are dropped.
    WalkNotFound { walk_id: WalkId },
    /// The walk was already finalized; late batches are dropped.
    WalkFinished { walk_id: WalkId },
    /// The service rejected a batch payload as invalid; it is dropped.
    ValidationRejected { walk_id: WalkId, message: String },
    /// A batch exhausted its retry budget and was dropped.
    RetryLimitExceeded { walk_id: WalkId, points_lost: usize },
}

/// Events emitted by the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Lifecycle state changed.
    Status(RecordingStatus),
    /// A sample passed the outlier filter and entered the buffer.
    Point(GeoPoint),
    /// A sample was rejected by the outlier filter.
    PointRejected(GeoPoint),
    /// Pending-work counters changed.
    QueueStats(QueueStatsSnapshot),
    /// A batch was accepted by the service and removed from the queue.
    BatchDelivered {
        batch_id: BatchId,
        walk_id: WalkId,
        accepted: u32,
    },
    /// A batch was dropped or a session-level condition was detected.
    Notice(DeliveryNotice),
}
