//! End-to-end recording lifecycle against a mock ingestion service.

use pettrail::config::{DeliverySettings, SamplingSettings};
use pettrail::geo::GeoPoint;
use pettrail::ingest::{
    IngestClient, IngestError, PointsBatchResponse, SessionSummary, StartSessionResponse,
};
use pettrail::queue::{DurableQueue, SessionState, WalkId};
use pettrail::session::{PipelineConfig, RecordingStatus, SessionCoordinator, SessionError};
use pettrail::source::SimulatedSource;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

const WALK_ID: WalkId = 42;

/// In-memory stand-in for the walk service, with call accounting.
///
/// With a hang gate installed, every submit blocks until the gate reads
/// `false`, simulating a delivery stuck on a dead connection.
#[derive(Default)]
struct MockService {
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    fail_submits: AtomicBool,
    hang_gate: Mutex<Option<watch::Receiver<bool>>>,
    submitted: Mutex<Vec<(WalkId, Vec<GeoPoint>)>>,
}

impl MockService {
    fn submitted_points(&self, walk_id: WalkId) -> Vec<GeoPoint> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, _)| *w == walk_id)
            .flat_map(|(_, points)| points.iter().copied())
            .collect()
    }
}

impl IngestClient for MockService {
    async fn start_session(&self, _pet_id: i64) -> Result<StartSessionResponse, IngestError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StartSessionResponse {
            walk_id: WALK_ID,
            started_at: "2026-08-29T09:00:00Z".to_string(),
        })
    }

    async fn submit_points(
        &self,
        walk_id: WalkId,
        points: &[GeoPoint],
    ) -> Result<PointsBatchResponse, IngestError> {
        let gate = self.hang_gate.lock().unwrap().clone();
        if let Some(mut rx) = gate {
            while *rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        if self.fail_submits.load(Ordering::SeqCst) {
            return Err(IngestError::Transient("connection refused".into()));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((walk_id, points.to_vec()));
        Ok(PointsBatchResponse {
            received: points.len() as u32,
            accepted: points.len() as u32,
            discarded: 0,
        })
    }

    async fn stop_session(&self, walk_id: WalkId) -> Result<SessionSummary, IngestError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SessionSummary {
            walk_id,
            stopped_at: "2026-08-29T09:30:00Z".to_string(),
            distance: 1_250.0,
            duration: 1_800.0,
            average_pace: 1.44,
            badges: Vec::new(),
        })
    }
}

fn config(batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        sampling: SamplingSettings {
            batch_size,
            // Long interval so tests exercise size-triggered flushes only.
            flush_interval_secs: 60,
            max_speed_mps: 50.0,
            max_accuracy_m: 100.0,
        },
        delivery: DeliverySettings::default(),
    }
}

fn coordinator(
    queue: Arc<DurableQueue>,
    service: Arc<MockService>,
    batch_size: usize,
) -> SessionCoordinator<MockService> {
    let source = Arc::new(SimulatedSource::new(51.5, -0.12, Duration::from_millis(5)));
    SessionCoordinator::new(queue, service, source, config(batch_size))
}

#[tokio::test]
async fn test_record_and_stop_delivers_all_points() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    let session = coordinator(Arc::clone(&queue), Arc::clone(&service), 3);

    let walk_id = session.start_recording(1).await.unwrap();
    assert_eq!(walk_id, WALK_ID);
    assert_eq!(session.status(), RecordingStatus::Recording);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let summary = session.stop_recording().await.unwrap();
    assert_eq!(summary.walk_id, WALK_ID);
    assert_eq!(session.status(), RecordingStatus::Idle);

    // A background drain pass may still be finishing.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(service.start_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.stop_calls.load(Ordering::SeqCst), 1);
    assert_eq!(queue.count_all().unwrap(), 0);
    assert!(queue.load_session_state().unwrap().is_none());

    let points = service.submitted_points(WALK_ID);
    assert!(!points.is_empty());
    for pair in points.windows(2) {
        assert!(pair[0].timestamp_ms <= pair[1].timestamp_ms);
    }
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    let session = coordinator(queue, Arc::clone(&service), 3);

    session.start_recording(1).await.unwrap();
    assert!(matches!(
        session.start_recording(1).await,
        Err(SessionError::AlreadyRecording)
    ));
    assert_eq!(service.start_calls.load(Ordering::SeqCst), 1);

    session.stop_recording().await.unwrap();
}

#[tokio::test]
async fn test_stop_without_session_is_rejected() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    let session = coordinator(queue, Arc::clone(&service), 3);

    assert!(matches!(
        session.stop_recording().await,
        Err(SessionError::NotRecording)
    ));
    assert_eq!(service.stop_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resume_reattaches_without_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.db");

    // A previous process recorded walk 42, queued a batch, and died.
    {
        let queue = DurableQueue::open(&path).unwrap();
        queue
            .store_session_state(&SessionState {
                walk_id: WALK_ID,
                started_at_ms: 1_700_000_000_000,
                is_recording: true,
            })
            .unwrap();
        let stranded = vec![GeoPoint::new(51.5, -0.12, 1_000, None, None).unwrap()];
        queue.enqueue(WALK_ID, &stranded, 0).unwrap();
    }

    let queue = Arc::new(DurableQueue::open(&path).unwrap());
    let service = Arc::new(MockService::default());
    let session = coordinator(Arc::clone(&queue), Arc::clone(&service), 3);

    let resumed = session.resume_if_interrupted().await.unwrap();
    assert_eq!(resumed, Some(WALK_ID));
    assert_eq!(session.status(), RecordingStatus::Recording);
    // Resume must not open a second remote session.
    assert_eq!(service.start_calls.load(Ordering::SeqCst), 0);

    // The stranded batch drains on resume.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(queue.count_all().unwrap(), 0);
    assert!(!service.submitted_points(WALK_ID).is_empty());

    session.stop_recording().await.unwrap();
    assert_eq!(service.stop_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_resume_with_no_marker_is_a_no_op() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    let session = coordinator(queue, service, 3);

    assert!(session.resume_if_interrupted().await.unwrap().is_none());
    assert_eq!(session.status(), RecordingStatus::Idle);
}

#[tokio::test]
async fn test_offline_stop_keeps_batches_queued() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    service.fail_submits.store(true, Ordering::SeqCst);
    let session = coordinator(Arc::clone(&queue), Arc::clone(&service), 3);

    session.start_recording(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let summary = session.stop_recording().await.unwrap();
    assert_eq!(summary.walk_id, WALK_ID);

    // Undelivered batches survive the stop; the session marker does not.
    let queued = queue.count_all().unwrap();
    assert!(queued > 0);
    assert!(queue.load_session_state().unwrap().is_none());

    // Connectivity returns: one re-readied batch drains on wake.
    service.fail_submits.store(false, Ordering::SeqCst);
    let batch = queue.next_ready(i64::MAX).unwrap().unwrap();
    assert!(batch.retry_count >= 1);
    queue.reschedule(batch.id, batch.retry_count, 0).unwrap();
    session.wake();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(queue.count_all().unwrap(), queued - 1);
}

#[tokio::test]
async fn test_force_stop_discards_everything() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    service.fail_submits.store(true, Ordering::SeqCst);
    let session = coordinator(Arc::clone(&queue), Arc::clone(&service), 3);

    session.start_recording(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.force_stop_recording().await.unwrap();

    assert_eq!(session.status(), RecordingStatus::Idle);
    assert_eq!(queue.count_all().unwrap(), 0);
    assert!(queue.load_session_state().unwrap().is_none());
    assert_eq!(service.stop_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_handoff_submits_buffered_points() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    // Huge batch size keeps every point in memory.
    let session = coordinator(Arc::clone(&queue), Arc::clone(&service), 10_000);

    session.start_recording(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let handed_off = session.shutdown_handoff();
    assert!(handed_off > 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.submitted_points(WALK_ID).len(), handed_off);
}

#[tokio::test]
async fn test_stop_drain_wait_is_bounded_and_engine_recovers() {
    let queue = Arc::new(DurableQueue::open_in_memory().unwrap());
    let service = Arc::new(MockService::default());
    service.fail_submits.store(true, Ordering::SeqCst);
    let (hang_tx, hang_rx) = watch::channel(true);
    *service.hang_gate.lock().unwrap() = Some(hang_rx);

    let mut config = config(3);
    config.delivery.stop_drain_timeout_secs = 1;
    let source = Arc::new(SimulatedSource::new(51.5, -0.12, Duration::from_millis(5)));
    let session = SessionCoordinator::new(
        Arc::clone(&queue),
        Arc::clone(&service),
        source,
        config,
    );

    session.start_recording(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Every submit is wedged on the gate, so the final drain pass cannot
    // finish. The stop must still come back within its budget.
    let before = std::time::Instant::now();
    let summary = session.stop_recording().await.unwrap();
    assert!(before.elapsed() < Duration::from_secs(3));
    assert_eq!(summary.walk_id, WALK_ID);
    assert_eq!(session.status(), RecordingStatus::Idle);

    // The wedged batch is still queued, not lost with the abandoned wait.
    let queued = queue.count_all().unwrap();
    assert!(queued > 0);
    assert!(queue.load_session_state().unwrap().is_none());

    // The stuck delivery completes once the gate opens, and its failure
    // reschedules the batch instead of wedging the engine.
    hang_tx.send(false).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.fail_submits.store(false, Ordering::SeqCst);

    let batch = queue.next_ready(i64::MAX).unwrap().unwrap();
    queue.reschedule(batch.id, batch.retry_count, 0).unwrap();
    session.wake();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(queue.count_all().unwrap(), queued - 1);
    assert!(!service.submitted_points(WALK_ID).is_empty());
}
