//! PetTrail - offline-resilient walk telemetry pipeline
//!
//! This library provides the client-side delivery pipeline for a walk-tracking
//! application: it samples GPS positions during a recording session, filters
//! physically implausible fixes, groups accepted fixes into batches, persists
//! those batches to a store that survives process restarts and network outages,
//! and reliably drains them to a remote ingestion endpoint with bounded retries
//! and exponential backoff.
//!
//! # High-Level API
//!
//! Most consumers only need the [`session`] module:
//!
//! ```ignore
//! use pettrail::session::{SessionCoordinator, PipelineConfig};
//!
//! let coordinator = SessionCoordinator::new(queue, client, source, PipelineConfig::default());
//! coordinator.resume_if_interrupted()?;
//! let walk_id = coordinator.start_recording(pet_id).await?;
//! // ... later
//! let summary = coordinator.stop_recording().await?;
//! ```
//!
//! # Data Flow
//!
//! position source → outlier filter → batcher → durable queue → drain engine
//! → ingestion endpoint; acknowledgements flow back to remove or reschedule
//! queued batches.

pub mod batcher;
pub mod config;
pub mod drain;
pub mod geo;
pub mod ingest;
pub mod logging;
pub mod queue;
pub mod session;
pub mod source;
pub mod time;

/// Version of the PetTrail library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
