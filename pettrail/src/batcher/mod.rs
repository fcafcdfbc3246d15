//! In-memory point batching.
//!
//! Accepted samples accumulate in a buffer until it reaches capacity or a
//! flush interval elapses; either way the buffer is cut into a batch and
//! handed to the durable queue. If the queue is unavailable the cut batch
//! parks in an overflow list so samples keep flowing while storage is down.

use crate::geo::GeoPoint;

/// Size-bounded point buffer with storage-fault overflow.
///
/// Not thread-safe on its own; the session sampler owns it exclusively.
#[derive(Debug)]
pub struct PointBatcher {
    buffer: Vec<GeoPoint>,
    capacity: usize,
    overflow: Vec<Vec<GeoPoint>>,
}

impl PointBatcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            overflow: Vec::new(),
        }
    }

    /// Append a point. Returns `true` when the buffer has reached capacity
    /// and should be flushed.
    pub fn push(&mut self, point: GeoPoint) -> bool {
        self.buffer.push(point);
        self.buffer.len() >= self.capacity
    }

    /// Cut the current buffer into a batch, or `None` if it is empty.
    pub fn take(&mut self) -> Option<Vec<GeoPoint>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Park a batch that could not be persisted.
    pub fn push_overflow(&mut self, batch: Vec<GeoPoint>) {
        if !batch.is_empty() {
            self.overflow.push(batch);
        }
    }

    /// Retrieve all parked batches, oldest first.
    pub fn drain_overflow(&mut self) -> Vec<Vec<GeoPoint>> {
        std::mem::take(&mut self.overflow)
    }

    /// Drain everything held in memory, parked batches first, into one
    /// ordered point list. Used for the shutdown handoff.
    pub fn take_all_points(&mut self) -> Vec<GeoPoint> {
        let mut points: Vec<GeoPoint> = self.overflow.drain(..).flatten().collect();
        points.append(&mut self.buffer);
        points
    }

    /// Points currently buffered, including parked batches.
    pub fn len(&self) -> usize {
        self.buffer.len() + self.overflow.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
