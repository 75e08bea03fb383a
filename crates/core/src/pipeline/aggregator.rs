//! Per-batch completion state.
//!
//! Every job of a batch finalizes exactly once against the shared
//! [`BatchAggregator`]. The pending count is decremented with an atomic
//! `fetch_update`, so exactly one finalizer observes the transition to zero
//! and delivers the ordered result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::{EventHandle, PipelineEvent};
use crate::media::{MediaId, MediaItem};
use crate::metrics;

/// Totals shared by every batch of a builder.
#[derive(Debug, Default)]
pub(crate) struct BuildStats {
    pub(crate) total_built: AtomicU64,
    pub(crate) total_failed: AtomicU64,
}

/// Result delivered to the caller of a batch.
pub(crate) type BatchResult = Vec<Arc<MediaItem>>;

/// Shared completion state of one batch.
pub(crate) struct BatchAggregator {
    batch_id: Uuid,
    pending: AtomicUsize,
    failed: AtomicUsize,
    results: Mutex<HashMap<MediaId, Arc<MediaItem>>>,
    ordering: Arc<Vec<MediaId>>,
    tx: Mutex<Option<oneshot::Sender<BatchResult>>>,
    started: Instant,
    stats: Arc<BuildStats>,
    events: Option<EventHandle>,
}

impl BatchAggregator {
    /// Creates the aggregator for a batch whose jobs have the identities in
    /// `ordering`, in submission order.
    ///
    /// An empty batch resolves immediately.
    pub(crate) fn new(
        batch_id: Uuid,
        ordering: Vec<MediaId>,
        stats: Arc<BuildStats>,
        events: Option<EventHandle>,
    ) -> (Arc<Self>, oneshot::Receiver<BatchResult>) {
        let (tx, rx) = oneshot::channel();
        let expected = ordering.len();
        let aggregator = Arc::new(Self {
            batch_id,
            pending: AtomicUsize::new(expected),
            failed: AtomicUsize::new(0),
            results: Mutex::new(HashMap::with_capacity(expected)),
            ordering: Arc::new(ordering),
            tx: Mutex::new(Some(tx)),
            started: Instant::now(),
            stats,
            events,
        });

        if expected == 0 {
            aggregator.deliver();
        }

        (aggregator, rx)
    }

    pub(crate) fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Submission order of the batch.
    pub(crate) fn ordering(&self) -> &[MediaId] {
        &self.ordering
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Records the outcome of one job.
    ///
    /// `artifact` is `None` for a failed job. Returns true if this call
    /// resolved the batch. Finalizing more times than the batch has jobs is
    /// ignored.
    pub(crate) fn finalize(&self, id: MediaId, artifact: Option<Arc<MediaItem>>) -> bool {
        // Decrement and record under the results lock so the last finalizer
        // sees every result and a surplus call records nothing.
        let previous = {
            let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = self
                .pending
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

            if previous.is_ok() {
                match artifact {
                    Some(item) => {
                        self.stats.total_built.fetch_add(1, Ordering::Relaxed);
                        metrics::JOBS_FINALIZED.with_label_values(&["built"]).inc();
                        results.insert(id, item);
                    }
                    None => {
                        self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                        metrics::JOBS_FINALIZED.with_label_values(&["failed"]).inc();
                        self.failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            previous
        };

        match previous {
            Ok(1) => {
                self.deliver();
                true
            }
            Ok(_) => false,
            Err(_) => {
                warn!(batch_id = %self.batch_id, media_id = %id, "Job finalized after batch resolved");
                false
            }
        }
    }

    /// Sorts the accumulated results into submission order and resolves.
    fn deliver(&self) {
        let mut results =
            std::mem::take(&mut *self.results.lock().unwrap_or_else(PoisonError::into_inner));

        let ordered: BatchResult = self
            .ordering
            .iter()
            .filter_map(|id| results.remove(id))
            .collect();

        let built = ordered.len();
        let failed = self.failed.load(Ordering::Relaxed);
        let elapsed = self.started.elapsed();
        metrics::BATCH_DURATION
            .with_label_values(&[])
            .observe(elapsed.as_secs_f64());

        info!(
            batch_id = %self.batch_id,
            built,
            failed,
            duration_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );

        if let Some(ref events) = self.events {
            events.try_emit(PipelineEvent::BatchCompleted {
                batch_id: self.batch_id,
                built,
                failed,
                duration_ms: elapsed.as_millis() as u64,
            });
        }

        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(tx) = tx {
            // The caller may have dropped the pending batch.
            let _ = tx.send(ordered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FrameRate;

    fn item(id: MediaId) -> Arc<MediaItem> {
        Arc::new(MediaItem::new(id, id.to_string(), FrameRate::default()))
    }

    fn ids(n: usize) -> Vec<MediaId> {
        (0..n).map(|_| MediaId::generate()).collect()
    }

    fn aggregator(ordering: Vec<MediaId>) -> (Arc<BatchAggregator>, oneshot::Receiver<BatchResult>) {
        BatchAggregator::new(Uuid::new_v4(), ordering, Arc::new(BuildStats::default()), None)
    }

    #[tokio::test]
    async fn test_empty_batch_resolves_immediately() {
        let (_aggregator, rx) = aggregator(Vec::new());
        assert!(rx.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_submission_order() {
        let ids = ids(4);
        let (aggregator, rx) = aggregator(ids.clone());

        assert!(!aggregator.finalize(ids[2], Some(item(ids[2]))));
        assert!(!aggregator.finalize(ids[0], Some(item(ids[0]))));
        assert!(!aggregator.finalize(ids[1], None));
        assert_eq!(aggregator.pending(), 1);
        assert!(aggregator.finalize(ids[3], Some(item(ids[3]))));

        let result: Vec<MediaId> = rx.await.unwrap().iter().map(|m| m.id()).collect();
        assert_eq!(result, vec![ids[0], ids[2], ids[3]]);
    }

    #[tokio::test]
    async fn test_extra_finalize_is_ignored() {
        let ids = ids(1);
        let (aggregator, rx) = aggregator(ids.clone());

        assert!(aggregator.finalize(ids[0], Some(item(ids[0]))));
        assert!(!aggregator.finalize(ids[0], None));
        assert_eq!(aggregator.pending(), 0);
        assert_eq!(rx.await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_finalize_resolves_once() {
        let ids = ids(200);
        let (aggregator, rx) = aggregator(ids.clone());

        let handles: Vec<_> = ids
            .iter()
            .copied()
            .map(|id| {
                let aggregator = Arc::clone(&aggregator);
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    aggregator.finalize(id, Some(item(id)))
                })
            })
            .collect();

        let mut resolutions = 0;
        for handle in handles {
            if handle.await.unwrap() {
                resolutions += 1;
            }
        }

        assert_eq!(resolutions, 1);
        let result: Vec<MediaId> = rx.await.unwrap().iter().map(|m| m.id()).collect();
        assert_eq!(result, ids);
    }

    #[tokio::test]
    async fn test_finalize_after_resolution_records_nothing() {
        let ids = ids(1);
        let stats = Arc::new(BuildStats::default());
        let (aggregator, rx) =
            BatchAggregator::new(Uuid::new_v4(), ids.clone(), Arc::clone(&stats), None);

        assert!(aggregator.finalize(ids[0], None));
        assert!(!aggregator.finalize(ids[0], Some(item(ids[0]))));
        assert!(!aggregator.finalize(ids[0], None));

        assert_eq!(stats.total_built.load(Ordering::Relaxed), 0);
        assert_eq!(stats.total_failed.load(Ordering::Relaxed), 1);
        assert!(aggregator.results.lock().unwrap().is_empty());
        assert!(rx.await.unwrap().is_empty());
    }

    #[test]
    fn test_stats_count_outcomes() {
        let ids = ids(2);
        let stats = Arc::new(BuildStats::default());
        let (aggregator, _rx) =
            BatchAggregator::new(Uuid::new_v4(), ids.clone(), Arc::clone(&stats), None);

        aggregator.finalize(ids[0], Some(item(ids[0])));
        aggregator.finalize(ids[1], None);

        assert_eq!(stats.total_built.load(Ordering::Relaxed), 1);
        assert_eq!(stats.total_failed.load(Ordering::Relaxed), 1);
    }
}
