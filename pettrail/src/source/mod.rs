//! Position sample sources.
//!
//! A [`PositionSource`] produces raw [`GeoPoint`] samples for the session
//! sampler. Production builds wire in a platform geolocation adapter; this
//! crate ships [`SimulatedSource`] for demos and tests.

mod simulated;

pub use simulated::SimulatedSource;

use crate::geo::GeoPoint;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The platform refused to provide position updates.
    #[error("position access denied: {0}")]
    PermissionDenied(String),

    /// The source could not start producing samples.
    #[error("position source unavailable: {0}")]
    Unavailable(String),
}

/// A stream of raw position samples.
///
/// `watch` starts production and returns the receiving end; the source
/// stops producing (and the channel closes) when `cancel` fires.
pub trait PositionSource: Send + Sync {
    fn watch(&self, cancel: CancellationToken) -> Result<mpsc::Receiver<GeoPoint>, SourceError>;
}
