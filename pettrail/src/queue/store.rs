//! SQLite-backed durable queue implementation.

use super::types::{Batch, BatchId, QueueError, SessionState, WalkId};
use crate::geo::GeoPoint;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS batches (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      walk_id INTEGER NOT NULL,
      points TEXT NOT NULL,
      retry_count INTEGER NOT NULL DEFAULT 0,
      next_attempt_at INTEGER NOT NULL,
      created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_batches_ready ON batches(next_attempt_at, id);
    CREATE INDEX IF NOT EXISTS idx_batches_walk ON batches(walk_id);
    CREATE TABLE IF NOT EXISTS session_meta (
      k TEXT PRIMARY KEY,
      v TEXT NOT NULL
    );
";

const META_WALK_ID: &str = "walk_id";
const META_STARTED_AT: &str = "started_at";
const META_IS_RECORDING: &str = "is_recording";

/// Persistent queue of batches with retry metadata.
///
/// Tolerates concurrent invocation from the batcher (writer) and the drain
/// engine (reader/writer) by serializing every operation behind the
/// connection mutex.
pub struct DurableQueue {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DurableQueue {
    /// Open (or create) the queue database at `path`.
    ///
    /// If the file exists but cannot be opened or its schema cannot be
    /// applied - the corruption case - the database is deleted and recreated
    /// from scratch rather than blocking the pipeline. Queued batches are
    /// lost in that path; the loss is logged, never silent.
    pub fn open(path: &Path) -> Result<Self, QueueError> {
        match Self::try_open(path) {
            Ok(conn) => Ok(Self {
                conn: Mutex::new(conn),
                path: Some(path.to_path_buf()),
            }),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Recreating batch store after open failure; queued batches lost"
                );
                Self::delete_database_files(path);
                let conn = Self::try_open(path)?;
                Ok(Self {
                    conn: Mutex::new(conn),
                    path: Some(path.to_path_buf()),
                })
            }
        }
    }

    /// Open an in-memory queue. Used by tests and as a degraded fallback.
    pub fn open_in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn try_open(path: &Path) -> Result<Connection, QueueError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn delete_database_files(path: &Path) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = path.as_os_str().to_owned();
            p.push(suffix);
            let _ = fs::remove_file(PathBuf::from(p));
        }
    }

    /// Path of the backing database file, if disk-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert a new batch with `retry_count = 0` and immediate readiness.
    ///
    /// Returns the queue-assigned monotonic id.
    ///
    /// # Errors
    ///
    /// `EmptyBatch` for a zero-point batch; `Storage` if the store is
    /// unavailable.
    pub fn enqueue(
        &self,
        walk_id: WalkId,
        points: &[GeoPoint],
        now_ms: i64,
    ) -> Result<BatchId, QueueError> {
        if points.is_empty() {
            return Err(QueueError::EmptyBatch);
        }
        let payload = serde_json::to_string(points)?;
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO batches (walk_id, points, retry_count, next_attempt_at, created_at)
             VALUES (?1, ?2, 0, ?3, ?3)",
            params![walk_id, payload, now_ms],
        )?;
        let id = conn.last_insert_rowid();
        debug!(batch_id = id, walk_id, points = points.len(), "Batch enqueued");
        Ok(id)
    }

    /// Return the batch with the smallest `next_attempt_at` among those with
    /// `next_attempt_at <= now`, ties broken by ascending id.
    ///
    /// Returns `None` when nothing is ready.
    pub fn next_ready(&self, now_ms: i64) -> Result<Option<Batch>, QueueError> {
        let conn = self.lock_conn();
        let row = conn
            .query_row(
                "SELECT id, walk_id, points, retry_count, next_attempt_at, created_at
                 FROM batches
                 WHERE next_attempt_at <= ?1
                 ORDER BY next_attempt_at ASC, id ASC
                 LIMIT 1",
                params![now_ms],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((id, walk_id, payload, retry_count, next_attempt_at_ms, created_at_ms)) => {
                let points: Vec<GeoPoint> = serde_json::from_str(&payload)?;
                Ok(Some(Batch {
                    id,
                    walk_id,
                    points,
                    retry_count,
                    next_attempt_at_ms,
                    created_at_ms,
                }))
            }
        }
    }

    /// Delete a batch. A no-op (not an error) if it is already absent.
    pub fn remove(&self, id: BatchId) -> Result<(), QueueError> {
        let conn = self.lock_conn();
        conn.execute("DELETE FROM batches WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Update retry metadata after a failed-but-retryable delivery attempt.
    ///
    /// # Errors
    ///
    /// `NotFound` if the batch no longer exists (concurrently removed).
    pub fn reschedule(
        &self,
        id: BatchId,
        retry_count: u32,
        next_attempt_at_ms: i64,
    ) -> Result<(), QueueError> {
        let conn = self.lock_conn();
        let changed = conn.execute(
            "UPDATE batches SET retry_count = ?2, next_attempt_at = ?3 WHERE id = ?1",
            params![id, retry_count, next_attempt_at_ms],
        )?;
        if changed == 0 {
            return Err(QueueError::NotFound(id));
        }
        Ok(())
    }

    /// Total number of queued batches.
    pub fn count_all(&self) -> Result<u64, QueueError> {
        let conn = self.lock_conn();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM batches", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Number of queued batches for one walk session.
    pub fn count_by_walk(&self, walk_id: WalkId) -> Result<u64, QueueError> {
        let conn = self.lock_conn();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM batches WHERE walk_id = ?1",
            params![walk_id],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Bulk cleanup for an abandoned or force-stopped session.
    ///
    /// Returns the number of batches deleted.
    pub fn remove_all_for_walk(&self, walk_id: WalkId) -> Result<u64, QueueError> {
        let conn = self.lock_conn();
        let n = conn.execute("DELETE FROM batches WHERE walk_id = ?1", params![walk_id])?;
        if n > 0 {
            debug!(walk_id, removed = n, "Cleared queued batches for walk");
        }
        Ok(n as u64)
    }

    /// Persist the recording session state as individual key/value entries.
    pub fn store_session_state(&self, state: &SessionState) -> Result<(), QueueError> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT OR REPLACE INTO session_meta (k, v) VALUES (?1, ?2)",
            params![META_WALK_ID, state.walk_id.to_string()],
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO session_meta (k, v) VALUES (?1, ?2)",
            params![META_STARTED_AT, state.started_at_ms.to_string()],
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO session_meta (k, v) VALUES (?1, ?2)",
            params![META_IS_RECORDING, if state.is_recording { "1" } else { "0" }],
        )?;
        Ok(())
    }

    /// Load the persisted session state, if all fields are present.
    pub fn load_session_state(&self) -> Result<Option<SessionState>, QueueError> {
        let conn = self.lock_conn();
        let read = |key: &str| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT v FROM session_meta WHERE k = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        };

        let (walk_id, started_at, is_recording) = (
            read(META_WALK_ID)?,
            read(META_STARTED_AT)?,
            read(META_IS_RECORDING)?,
        );
        match (walk_id, started_at, is_recording) {
            (Some(walk_id), Some(started_at), Some(is_recording)) => {
                let walk_id: WalkId = match walk_id.parse() {
                    Ok(id) => id,
                    Err(_) => {
                        warn!(value = %walk_id, "Discarding unparseable persisted walk id");
                        return Ok(None);
                    }
                };
                Ok(Some(SessionState {
                    walk_id,
                    started_at_ms: started_at.parse().unwrap_or(0),
                    is_recording: is_recording == "1",
                }))
            }
            _ => Ok(None),
        }
    }

    /// Clear the persisted session state.
    pub fn clear_session_state(&self) -> Result<(), QueueError> {
        let conn = self.lock_conn();
        conn.execute(
            "DELETE FROM session_meta WHERE k IN (?1, ?2, ?3)",
            params![META_WALK_ID, META_STARTED_AT, META_IS_RECORDING],
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned mutex means another thread panicked mid-statement;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points(n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|i| {
                GeoPoint::new(40.0 + i as f64 * 1e-5, -74.0, 1_000 + i as i64 * 1_000, None, None)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_enqueue_assigns_monotonic_ids() {
        let queue = DurableQueue::open_in_memory().unwrap();
        let a = queue.enqueue(1, &sample_points(2), 100).unwrap();
        let b = queue.enqueue(1, &sample_points(2), 100).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let queue = DurableQueue::open_in_memory().unwrap();
        assert!(matches!(
            queue.enqueue(1, &[], 100),
            Err(QueueError::EmptyBatch)
        ));
    }

    #[test]
    fn test_next_ready_respects_deadline() {
        let queue = DurableQueue::open_in_memory().unwrap();
        let id = queue.enqueue(1, &sample_points(1), 500).unwrap();
        queue.reschedule(id, 1, 1_000).unwrap();

        assert!(queue.next_ready(999).unwrap().is_none());
        let batch = queue.next_ready(1_000).unwrap().unwrap();
        assert_eq!(batch.id, id);
        assert_eq!(batch.retry_count, 1);
    }

    #[test]
    fn test_next_ready_orders_by_deadline_then_id() {
        let queue = DurableQueue::open_in_memory().unwrap();
        let a = queue.enqueue(1, &sample_points(1), 100).unwrap();
        let b = queue.enqueue(1, &sample_points(1), 100).unwrap();
        let c = queue.enqueue(2, &sample_points(1), 100).unwrap();

        // Push `a` into the future; `b` and `c` share a deadline, so the
        // smaller id wins.
        queue.reschedule(a, 1, 10_000).unwrap();
        assert_eq!(queue.next_ready(200).unwrap().unwrap().id, b);
        queue.remove(b).unwrap();
        assert_eq!(queue.next_ready(200).unwrap().unwrap().id, c);
        queue.remove(c).unwrap();
        assert!(queue.next_ready(200).unwrap().is_none());
        assert_eq!(queue.next_ready(10_000).unwrap().unwrap().id, a);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let queue = DurableQueue::open_in_memory().unwrap();
        let id = queue.enqueue(1, &sample_points(1), 100).unwrap();
        queue.remove(id).unwrap();
        queue.remove(id).unwrap();
    }

    #[test]
    fn test_reschedule_missing_batch_is_not_found() {
        let queue = DurableQueue::open_in_memory().unwrap();
        assert!(matches!(
            queue.reschedule(42, 1, 1_000),
            Err(QueueError::NotFound(42))
        ));
    }

    #[test]
    fn test_counts_track_enqueues_and_removals() {
        let queue = DurableQueue::open_in_memory().unwrap();
        assert_eq!(queue.count_all().unwrap(), 0);
        let a = queue.enqueue(7, &sample_points(1), 100).unwrap();
        queue.enqueue(7, &sample_points(1), 100).unwrap();
        queue.enqueue(9, &sample_points(1), 100).unwrap();
        assert_eq!(queue.count_all().unwrap(), 3);
        assert_eq!(queue.count_by_walk(7).unwrap(), 2);
        assert_eq!(queue.count_by_walk(9).unwrap(), 1);

        queue.remove(a).unwrap();
        assert_eq!(queue.count_all().unwrap(), 2);

        assert_eq!(queue.remove_all_for_walk(7).unwrap(), 1);
        assert_eq!(queue.count_all().unwrap(), 1);
        assert_eq!(queue.count_by_walk(9).unwrap(), 1);
    }

    #[test]
    fn test_batch_round_trip_preserves_points() {
        let queue = DurableQueue::open_in_memory().unwrap();
        let points = sample_points(3);
        let id = queue.enqueue(5, &points, 250).unwrap();
        let batch = queue.next_ready(250).unwrap().unwrap();
        assert_eq!(batch.id, id);
        assert_eq!(batch.walk_id, 5);
        assert_eq!(batch.points, points);
        assert_eq!(batch.retry_count, 0);
        assert_eq!(batch.created_at_ms, 250);
        assert_eq!(batch.next_attempt_at_ms, 250);
    }

    #[test]
    fn test_session_state_round_trip() {
        let queue = DurableQueue::open_in_memory().unwrap();
        assert!(queue.load_session_state().unwrap().is_none());

        let state = SessionState {
            walk_id: 42,
            started_at_ms: 1_700_000_000_000,
            is_recording: true,
        };
        queue.store_session_state(&state).unwrap();
        assert_eq!(queue.load_session_state().unwrap().unwrap(), state);

        queue.clear_session_state().unwrap();
        assert!(queue.load_session_state().unwrap().is_none());
    }
}
