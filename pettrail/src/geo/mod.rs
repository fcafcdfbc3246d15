//! Position types and sample hygiene.
//!
//! This module defines the fundamental position types used throughout the
//! pipeline:
//!
//! - [`GeoPoint`] - Immutable position sample with wall-clock timestamp
//! - [`distance_m`] - Great-circle distance between two samples
//! - [`OutlierFilterConfig`] / [`accept`] - Implied-speed sample rejection

mod distance;
mod filter;
mod point;

pub use distance::{distance_m, EARTH_RADIUS_M};
pub use filter::{accept, implied_speed_mps, OutlierFilterConfig};
pub use point::{GeoPoint, GeoPointError};
