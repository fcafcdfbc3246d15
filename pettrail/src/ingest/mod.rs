//! Remote ingestion service client.
//!
//! This module provides traits and implementations for talking to the walk
//! ingestion endpoint: starting a session, submitting point batches, and
//! stopping a session.
//!
//! # Trait seam
//!
//! The [`IngestClient`] trait exists so the drain engine and session
//! coordinator can be exercised against scripted mock clients in tests;
//! [`HttpIngestClient`] is the production reqwest-backed implementation.
//!
//! # Fault classes
//!
//! Every failure is classified into the pipeline's fault taxonomy
//! ([`IngestError`]): validation, not-found, and conflict responses are
//! terminal (never retried); network failures and server-side faults are
//! transient (retried with backoff by the drain engine).

mod error;
mod http;
mod types;

pub use error::IngestError;
pub use http::HttpIngestClient;
pub use types::{
    ApiErrorBody, PointsBatchRequest, PointsBatchResponse, SessionSummary, StartSessionResponse,
    WirePoint,
};

use crate::geo::GeoPoint;
use crate::queue::WalkId;
use std::future::Future;

/// Client for the remote walk ingestion service.
pub trait IngestClient: Send + Sync {
    /// Start a walk session for a pet.
    fn start_session(
        &self,
        pet_id: i64,
    ) -> impl Future<Output = Result<StartSessionResponse, IngestError>> + Send;

    /// Deliver one batch of position samples to a session.
    fn submit_points(
        &self,
        walk_id: WalkId,
        points: &[GeoPoint],
    ) -> impl Future<Output = Result<PointsBatchResponse, IngestError>> + Send;

    /// Stop a session and retrieve its summary.
    fn stop_session(
        &self,
        walk_id: WalkId,
    ) -> impl Future<Output = Result<SessionSummary, IngestError>> + Send;
}
