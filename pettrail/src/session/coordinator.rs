//! Session lifecycle coordination.

use super::events::{PipelineEvent, QueueStatsSnapshot, RecordingStatus};
use super::sampler::{sampler_loop, SamplerContext};
use super::SessionError;
use crate::batcher::PointBatcher;
use crate::config::{ConfigFile, DeliverySettings, SamplingSettings};
use crate::drain::DrainEngine;
use crate::geo::OutlierFilterConfig;
use crate::ingest::{IngestClient, SessionSummary};
use crate::queue::{DurableQueue, SessionState, WalkId};
use crate::source::PositionSource;
use crate::time::now_ms;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pipeline tuning knobs, sliced out of the full config file.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub sampling: SamplingSettings,
    pub delivery: DeliverySettings,
}

impl From<&ConfigFile> for PipelineConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            sampling: config.sampling.clone(),
            delivery: config.delivery.clone(),
        }
    }
}

/// Mutable session state, guarded by one mutex so lifecycle transitions
/// are serialized.
struct Inner {
    status: RecordingStatus,
    walk_id: Option<WalkId>,
    started_at_ms: i64,
    cancel: Option<CancellationToken>,
    sampler: Option<JoinHandle<()>>,
    flush_tx: Option<mpsc::Sender<()>>,
}

/// Owns the recording pipeline for one walk session at a time.
pub struct SessionCoordinator<C: IngestClient + 'static> {
    queue: Arc<DurableQueue>,
    client: Arc<C>,
    source: Arc<dyn PositionSource>,
    drain: Arc<DrainEngine<C>>,
    batcher: Arc<Mutex<PointBatcher>>,
    config: PipelineConfig,
    events: broadcast::Sender<PipelineEvent>,
    inner: Mutex<Inner>,
}

impl<C: IngestClient + 'static> SessionCoordinator<C> {
    pub fn new(
        queue: Arc<DurableQueue>,
        client: Arc<C>,
        source: Arc<dyn PositionSource>,
        config: PipelineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        let drain = Arc::new(DrainEngine::new(
            Arc::clone(&queue),
            Arc::clone(&client),
            config.delivery.drain_settings(),
            events.clone(),
        ));
        let batcher = Arc::new(Mutex::new(PointBatcher::new(config.sampling.batch_size)));

        Self {
            queue,
            client,
            source,
            drain,
            batcher,
            config,
            events,
            inner: Mutex::new(Inner {
                status: RecordingStatus::Idle,
                walk_id: None,
                started_at_ms: 0,
                cancel: None,
                sampler: None,
                flush_tx: None,
            }),
        }
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle state.
    pub fn status(&self) -> RecordingStatus {
        self.lock_inner().status
    }

    /// Walk id of the active session, if any.
    pub fn current_walk(&self) -> Option<WalkId> {
        self.lock_inner().walk_id
    }

    /// Epoch ms the active session started, if any.
    pub fn started_at_ms(&self) -> Option<i64> {
        let inner = self.lock_inner();
        inner.walk_id.map(|_| inner.started_at_ms)
    }

    /// Start a new recording session for a pet.
    ///
    /// Confirms the remote walk session first, persists the session state
    /// for crash recovery, then starts the sampler.
    ///
    /// # Errors
    ///
    /// `AlreadyRecording` if a session is active; `Ingest` if the service
    /// refused to start a walk; `Source` if position updates are
    /// unavailable.
    pub async fn start_recording(&self, pet_id: i64) -> Result<WalkId, SessionError> {
        {
            let mut inner = self.lock_inner();
            if inner.status != RecordingStatus::Idle {
                return Err(SessionError::AlreadyRecording);
            }
            inner.status = RecordingStatus::Starting;
        }
        self.emit_status(RecordingStatus::Starting);

        let started = match self.client.start_session(pet_id).await {
            Ok(r) => r,
            Err(e) => {
                self.reset_to_idle();
                return Err(e.into());
            }
        };
        let walk_id = started.walk_id;
        let started_at_ms = now_ms();
        info!(walk_id, pet_id, "Walk session started");

        // Crash recovery marker. If the store is down, recording still
        // proceeds; only resume-after-crash is lost.
        if let Err(e) = self.queue.store_session_state(&SessionState {
            walk_id,
            started_at_ms,
            is_recording: true,
        }) {
            warn!(walk_id, error = %e, "Could not persist session state");
        }

        if let Err(e) = self.attach(walk_id, started_at_ms) {
            // Remote session exists but we can't record into it.
            if let Err(stop_err) = self.client.stop_session(walk_id).await {
                debug!(walk_id, error = %stop_err, "Cleanup stop after failed start");
            }
            if let Err(clear_err) = self.queue.clear_session_state() {
                warn!(error = %clear_err, "Could not clear session state");
            }
            self.reset_to_idle();
            return Err(e);
        }

        self.set_status(RecordingStatus::Recording);
        Ok(walk_id)
    }

    /// Stop the active recording and fetch the walk summary.
    ///
    /// The sampler flushes its partial buffer on the way out, then a final
    /// drain pass runs, bounded by the configured stop-drain timeout.
    /// Batches still queued after the timeout stay on disk and are
    /// delivered by later drain passes.
    pub async fn stop_recording(&self) -> Result<SessionSummary, SessionError> {
        let (walk_id, cancel, sampler) = self.begin_stop()?;

        cancel.cancel();
        if let Some(handle) = sampler {
            let _ = handle.await;
        }

        // Bound the wait, not the pass: the pass keeps running detached so
        // an in-flight delivery is never interrupted mid-submit.
        let drain_budget = Duration::from_secs(self.config.delivery.stop_drain_timeout_secs);
        let drain = Arc::clone(&self.drain);
        let final_pass = tokio::spawn(async move { drain.run_pass().await });
        if timeout(drain_budget, final_pass).await.is_err() {
            debug!(walk_id, "Final drain still running at timeout, leaving remainder queued");
        }

        let result = self.client.stop_session(walk_id).await;

        if let Err(e) = self.queue.clear_session_state() {
            warn!(error = %e, "Could not clear session state");
        }
        self.reset_to_idle();

        match result {
            Ok(summary) => {
                info!(walk_id, distance = summary.distance, "Walk session stopped");
                Ok(summary)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Abandon the active recording, discarding everything undelivered.
    ///
    /// The remote stop is best-effort; local state is cleaned up
    /// unconditionally.
    pub async fn force_stop_recording(&self) -> Result<(), SessionError> {
        let (walk_id, cancel, sampler) = self.begin_stop()?;

        cancel.cancel();
        if let Some(handle) = sampler {
            let _ = handle.await;
        }

        // Discard buffered and parked points.
        let discarded = self.lock_batcher().take_all_points().len();

        if let Err(e) = self.client.stop_session(walk_id).await {
            debug!(walk_id, error = %e, "Best-effort stop failed");
        }
        match self.queue.remove_all_for_walk(walk_id) {
            Ok(dropped) => {
                info!(walk_id, discarded, dropped_batches = dropped, "Walk session force-stopped")
            }
            Err(e) => warn!(walk_id, error = %e, "Could not drop queued batches"),
        }
        if let Err(e) = self.queue.clear_session_state() {
            warn!(error = %e, "Could not clear session state");
        }
        self.reset_to_idle();
        Ok(())
    }

    /// Re-attach to a session interrupted by a crash or kill.
    ///
    /// Reads the persisted session marker; if it describes a live
    /// recording, the sampler restarts against the same walk id without a
    /// new `start_session` call, and queued batches start draining.
    ///
    /// Returns the resumed walk id, or `None` when there is nothing to
    /// resume.
    pub async fn resume_if_interrupted(&self) -> Result<Option<WalkId>, SessionError> {
        let state = match self.queue.load_session_state()? {
            Some(state) if state.is_recording => state,
            _ => return Ok(None),
        };

        {
            let mut inner = self.lock_inner();
            if inner.status != RecordingStatus::Idle {
                return Ok(None);
            }
            inner.status = RecordingStatus::Resuming;
        }
        self.emit_status(RecordingStatus::Resuming);
        info!(walk_id = state.walk_id, "Resuming interrupted walk session");

        if let Err(e) = self.attach(state.walk_id, state.started_at_ms) {
            self.reset_to_idle();
            return Err(e);
        }

        self.set_status(RecordingStatus::Recording);
        self.drain.trigger();
        Ok(Some(state.walk_id))
    }

    /// Nudge delivery after connectivity returns.
    pub fn wake(&self) {
        self.drain.trigger();
    }

    /// Flush the in-memory buffer and kick a drain pass.
    pub fn flush_now(&self) {
        let flush_tx = self.lock_inner().flush_tx.clone();
        if let Some(tx) = flush_tx {
            let _ = tx.try_send(());
        }
        self.drain.trigger();
    }

    /// Snapshot of pending work.
    pub fn recording_stats(&self) -> Result<QueueStatsSnapshot, SessionError> {
        Ok(QueueStatsSnapshot {
            queued_batches: self.queue.count_all()?,
            buffered_points: self.lock_batcher().len(),
        })
    }

    /// Last-gasp delivery of in-memory points during process shutdown.
    ///
    /// Spawns a single fire-and-forget submit with no retry and no store
    /// involvement. Returns the number of points handed off.
    pub fn shutdown_handoff(&self) -> usize {
        let walk_id = self.lock_inner().walk_id;
        let Some(walk_id) = walk_id else {
            return 0;
        };

        let points = self.lock_batcher().take_all_points();
        if points.is_empty() {
            return 0;
        }
        let count = points.len();
        info!(walk_id, points = count, "Handing off buffered points on shutdown");

        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            if let Err(e) = client.submit_points(walk_id, &points).await {
                debug!(walk_id, error = %e, "Shutdown handoff submit failed");
            }
        });
        count
    }

    /// Spawn the sampler against an active walk id.
    fn attach(&self, walk_id: WalkId, started_at_ms: i64) -> Result<(), SessionError> {
        let cancel = CancellationToken::new();
        let points_rx = self.source.watch(cancel.clone())?;
        let (flush_tx, flush_rx) = mpsc::channel(4);

        let ctx = SamplerContext {
            walk_id,
            batcher: Arc::clone(&self.batcher),
            queue: Arc::clone(&self.queue),
            drain: Arc::clone(&self.drain),
            filter: OutlierFilterConfig {
                max_speed_mps: self.config.sampling.max_speed_mps,
                max_accuracy_m: self.config.sampling.max_accuracy_m,
            },
            flush_interval: Duration::from_secs(self.config.sampling.flush_interval_secs),
            events: self.events.clone(),
        };
        let handle = tokio::spawn(sampler_loop(ctx, points_rx, flush_rx, cancel.clone()));

        let mut inner = self.lock_inner();
        inner.walk_id = Some(walk_id);
        inner.started_at_ms = started_at_ms;
        inner.cancel = Some(cancel);
        inner.sampler = Some(handle);
        inner.flush_tx = Some(flush_tx);
        Ok(())
    }

    /// Claim the `-> Stopping` edge and take ownership of the sampler.
    fn begin_stop(
        &self,
    ) -> Result<(WalkId, CancellationToken, Option<JoinHandle<()>>), SessionError> {
        let mut inner = self.lock_inner();
        match inner.status {
            RecordingStatus::Recording | RecordingStatus::Resuming => {}
            _ => return Err(SessionError::NotRecording),
        }
        let Some(walk_id) = inner.walk_id.take() else {
            inner.status = RecordingStatus::Idle;
            return Err(SessionError::NotRecording);
        };
        inner.status = RecordingStatus::Stopping;
        let cancel = inner.cancel.take().unwrap_or_default();
        let sampler = inner.sampler.take();
        inner.flush_tx = None;
        drop(inner);

        self.emit_status(RecordingStatus::Stopping);
        Ok((walk_id, cancel, sampler))
    }

    fn set_status(&self, status: RecordingStatus) {
        self.lock_inner().status = status;
        self.emit_status(status);
    }

    fn reset_to_idle(&self) {
        {
            let mut inner = self.lock_inner();
            inner.status = RecordingStatus::Idle;
            inner.walk_id = None;
            inner.cancel = None;
            inner.sampler = None;
            inner.flush_tx = None;
        }
        self.emit_status(RecordingStatus::Idle);
    }

    fn emit_status(&self, status: RecordingStatus) {
        let _ = self.events.send(PipelineEvent::Status(status));
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_batcher(&self) -> MutexGuard<'_, PointBatcher> {
        self.batcher.lock().unwrap_or_else(|e| e.into_inner())
    }
}
