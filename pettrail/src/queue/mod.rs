//! Durable batch queue.
//!
//! Batches of accepted position samples are persisted here between the
//! moment the batcher flushes them and the moment the drain engine gets a
//! delivery acknowledgement (or gives up). The store survives process
//! restarts and network outages; it is the component that guarantees no
//! silent data loss while the device is offline.
//!
//! # Storage layout
//!
//! A single SQLite database holds two tables:
//!
//! - `batches` - one row per pending batch, keyed by a monotonic rowid, with
//!   a composite index on `(next_attempt_at, id)` for readiness-ordered
//!   dequeue
//! - `session_meta` - key/value entries for the persisted recording session
//!   state, so an interrupted recording can be resumed after restart
//!
//! All access is serialized behind a connection mutex; individual operations
//! are atomic at single-batch granularity. No cross-batch transactions are
//! needed.

mod store;
mod types;

pub use store::DurableQueue;
pub use types::{Batch, BatchId, QueueError, SessionState, WalkId};
