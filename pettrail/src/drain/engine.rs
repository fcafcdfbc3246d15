//! Single-flight queue drain.

use super::backoff::backoff_with_jitter_ms;
use super::DrainSettings;
use crate::ingest::{IngestClient, IngestError};
use crate::queue::{Batch, DurableQueue, QueueError};
use crate::session::{DeliveryNotice, PipelineEvent};
use crate::time::now_ms;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Dispatches ready batches from the durable queue to the ingestion service.
///
/// All delivery faults are absorbed here: a pass never returns an error,
/// it only removes or reschedules batches and emits events describing what
/// happened.
pub struct DrainEngine<C: IngestClient> {
    queue: Arc<DurableQueue>,
    client: Arc<C>,
    settings: DrainSettings,
    draining: AtomicBool,
    events: broadcast::Sender<PipelineEvent>,
}

impl<C: IngestClient + 'static> DrainEngine<C> {
    pub fn new(
        queue: Arc<DurableQueue>,
        client: Arc<C>,
        settings: DrainSettings,
        events: broadcast::Sender<PipelineEvent>,
    ) -> Self {
        Self {
            queue,
            client,
            settings,
            draining: AtomicBool::new(false),
            events,
        }
    }

    /// Kick off a pass in the background. Cheap to call from anywhere a
    /// batch lands or connectivity returns; overlapping triggers coalesce.
    pub fn trigger(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.run_pass().await;
        });
    }

    /// Run one drain pass to completion.
    ///
    /// Processes ready batches one at a time in `(next_attempt_at, id)`
    /// order until the queue has nothing ready. Returns immediately if a
    /// pass is already running.
    pub async fn run_pass(&self) {
        if self.draining.swap(true, Ordering::SeqCst) {
            debug!("Drain pass already in progress, skipping");
            return;
        }
        // Clears the flag on every exit path, including the pass future
        // being dropped mid-await.
        let _pass = PassGuard {
            flag: &self.draining,
        };

        loop {
            let batch = match self.queue.next_ready(now_ms()) {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Drain pass aborted, queue unavailable");
                    break;
                }
            };
            self.deliver(batch).await;
        }
    }

    async fn deliver(&self, batch: Batch) {
        let result = self.client.submit_points(batch.walk_id, &batch.points).await;

        match result {
            Ok(response) => {
                self.remove_batch(batch.id);
                debug!(
                    batch_id = batch.id,
                    walk_id = batch.walk_id,
                    accepted = response.accepted,
                    discarded = response.discarded,
                    "Batch delivered"
                );
                let _ = self.events.send(PipelineEvent::BatchDelivered {
                    batch_id: batch.id,
                    walk_id: batch.walk_id,
                    accepted: response.accepted,
                });
            }
            Err(IngestError::Validation { message, .. }) => {
                warn!(batch_id = batch.id, %message, "Batch rejected as invalid, dropping");
                self.remove_batch(batch.id);
                let _ = self
                    .events
                    .send(PipelineEvent::Notice(DeliveryNotice::ValidationRejected {
                        walk_id: batch.walk_id,
                        message,
                    }));
            }
            Err(IngestError::NotFound { .. }) => {
                warn!(
                    batch_id = batch.id,
                    walk_id = batch.walk_id,
                    "Walk unknown to service, dropping batch"
                );
                self.remove_batch(batch.id);
                let _ = self
                    .events
                    .send(PipelineEvent::Notice(DeliveryNotice::WalkNotFound {
                        walk_id: batch.walk_id,
                    }));
            }
            Err(IngestError::Conflict { .. }) => {
                info!(
                    batch_id = batch.id,
                    walk_id = batch.walk_id,
                    "Walk already finished, dropping batch"
                );
                self.remove_batch(batch.id);
                let _ = self
                    .events
                    .send(PipelineEvent::Notice(DeliveryNotice::WalkFinished {
                        walk_id: batch.walk_id,
                    }));
            }
            Err(err) => self.retry_later(batch, err),
        }
    }

    fn retry_later(&self, batch: Batch, err: IngestError) {
        let retry_count = batch.retry_count + 1;

        if retry_count > self.settings.max_retries {
            warn!(
                batch_id = batch.id,
                walk_id = batch.walk_id,
                retries = batch.retry_count,
                points = batch.points.len(),
                "Retry budget exhausted, dropping batch"
            );
            self.remove_batch(batch.id);
            let _ = self
                .events
                .send(PipelineEvent::Notice(DeliveryNotice::RetryLimitExceeded {
                    walk_id: batch.walk_id,
                    points_lost: batch.points.len(),
                }));
            return;
        }

        let delay_ms = backoff_with_jitter_ms(&self.settings, retry_count);
        let next_attempt_at_ms = now_ms() + delay_ms as i64;
        debug!(
            batch_id = batch.id,
            retry_count, delay_ms, error = %err, "Delivery failed, rescheduling"
        );

        match self.queue.reschedule(batch.id, retry_count, next_attempt_at_ms) {
            Ok(()) => {}
            Err(QueueError::NotFound(id)) => {
                debug!(batch_id = id, "Batch vanished before reschedule");
            }
            Err(e) => warn!(batch_id = batch.id, error = %e, "Failed to reschedule batch"),
        }
    }

    fn remove_batch(&self, id: crate::queue::BatchId) {
        if let Err(e) = self.queue.remove(id) {
            warn!(batch_id = id, error = %e, "Failed to remove batch");
        }
    }
}

struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
