//! Sampler stage: filter, batch, persist.

use super::events::{PipelineEvent, QueueStatsSnapshot};
use crate::batcher::PointBatcher;
use crate::drain::DrainEngine;
use crate::geo::{accept, GeoPoint, OutlierFilterConfig};
use crate::ingest::IngestClient;
use crate::queue::{DurableQueue, WalkId};
use crate::time::now_ms;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything the sampler loop needs, bundled so the coordinator can spawn
/// it with one move.
pub(super) struct SamplerContext<C: IngestClient> {
    pub walk_id: WalkId,
    pub batcher: Arc<Mutex<PointBatcher>>,
    pub queue: Arc<DurableQueue>,
    pub drain: Arc<DrainEngine<C>>,
    pub filter: OutlierFilterConfig,
    pub flush_interval: Duration,
    pub events: broadcast::Sender<PipelineEvent>,
}

/// Consume raw samples until cancelled.
///
/// Accepted points accumulate in the shared batcher; the buffer is flushed
/// to the durable queue when it fills, when the flush interval elapses,
/// when an explicit flush command arrives, or once more on cancellation.
pub(super) async fn sampler_loop<C: IngestClient + 'static>(
    ctx: SamplerContext<C>,
    mut points_rx: mpsc::Receiver<GeoPoint>,
    mut flush_rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    let mut last_accepted: Option<GeoPoint> = None;
    // First tick after one full interval, not immediately.
    let mut ticker = interval_at(Instant::now() + ctx.flush_interval, ctx.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(walk_id = ctx.walk_id, "Sampler started");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                flush_to_queue(&ctx);
                info!(walk_id = ctx.walk_id, "Sampler stopped");
                break;
            }

            point = points_rx.recv() => {
                let Some(point) = point else {
                    warn!(walk_id = ctx.walk_id, "Position source closed, flushing and stopping sampler");
                    flush_to_queue(&ctx);
                    break;
                };
                handle_point(&ctx, point, &mut last_accepted);
            }

            _ = flush_rx.recv() => {
                flush_to_queue(&ctx);
            }

            _ = ticker.tick() => {
                flush_to_queue(&ctx);
                // Retry batches whose backoff deadline has passed even when
                // no new points arrived this interval.
                ctx.drain.trigger();
            }
        }
    }
}

fn handle_point<C: IngestClient + 'static>(
    ctx: &SamplerContext<C>,
    point: GeoPoint,
    last_accepted: &mut Option<GeoPoint>,
) {
    if !accept(&point, last_accepted.as_ref(), &ctx.filter) {
        debug!(
            walk_id = ctx.walk_id,
            latitude = point.latitude,
            longitude = point.longitude,
            "Sample rejected by outlier filter"
        );
        let _ = ctx.events.send(PipelineEvent::PointRejected(point));
        return;
    }

    *last_accepted = Some(point);
    let _ = ctx.events.send(PipelineEvent::Point(point));

    let full = lock_batcher(&ctx.batcher).push(point);
    if full {
        flush_to_queue(ctx);
    }
}

/// Move everything buffered in memory into the durable queue.
///
/// Batches that cannot be persisted are parked back in the batcher's
/// overflow so a storage fault never stops sampling.
pub(super) fn flush_to_queue<C: IngestClient + 'static>(ctx: &SamplerContext<C>) {
    let mut pending = {
        let mut batcher = lock_batcher(&ctx.batcher);
        let mut batches = batcher.drain_overflow();
        if let Some(batch) = batcher.take() {
            batches.push(batch);
        }
        batches
    };

    if pending.is_empty() {
        return;
    }

    let mut enqueued = false;
    let mut failed: Vec<Vec<GeoPoint>> = Vec::new();
    for batch in pending.drain(..) {
        match ctx.queue.enqueue(ctx.walk_id, &batch, now_ms()) {
            Ok(_) => enqueued = true,
            Err(e) => {
                warn!(walk_id = ctx.walk_id, error = %e, points = batch.len(),
                      "Could not persist batch, parking in memory");
                failed.push(batch);
            }
        }
    }

    if !failed.is_empty() {
        let mut batcher = lock_batcher(&ctx.batcher);
        for batch in failed {
            batcher.push_overflow(batch);
        }
    }

    let _ = ctx.events.send(PipelineEvent::QueueStats(QueueStatsSnapshot {
        queued_batches: ctx.queue.count_all().unwrap_or(0),
        buffered_points: lock_batcher(&ctx.batcher).len(),
    }));

    if enqueued {
        ctx.drain.trigger();
    }
}

fn lock_batcher(batcher: &Mutex<PointBatcher>) -> std::sync::MutexGuard<'_, PointBatcher> {
    batcher.lock().unwrap_or_else(|e| e.into_inner())
}
