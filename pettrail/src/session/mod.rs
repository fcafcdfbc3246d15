//! Recording session coordination.
//!
//! The [`SessionCoordinator`] owns the whole pipeline for one recording at a
//! time: it starts the remote walk session, runs the sampler loop (filter,
//! batch, persist), and drives the drain engine. It also recovers sessions
//! interrupted by a crash and hands off in-memory points on shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Starting -> Recording -> Stopping -> Idle
//!   \-> Resuming  -> Recording
//! ```
//!
//! State transitions are serialized through an internal mutex; concurrent
//! `start_recording` calls race for the `Idle -> Starting` edge and the
//! loser gets `AlreadyRecording`.

mod coordinator;
mod events;
mod sampler;

pub use coordinator::{PipelineConfig, SessionCoordinator};
pub use events::{DeliveryNotice, PipelineEvent, QueueStatsSnapshot, RecordingStatus};

use crate::ingest::IngestError;
use crate::queue::QueueError;
use crate::source::SourceError;
use thiserror::Error;

/// Errors from session lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already starting, recording, or stopping.
    #[error("a recording session is already active")]
    AlreadyRecording,

    /// No session is active.
    #[error("no recording session is active")]
    NotRecording,

    /// The position source could not be started.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The ingestion service rejected a lifecycle request.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The durable queue failed.
    #[error(transparent)]
    Storage(#[from] QueueError),
}
