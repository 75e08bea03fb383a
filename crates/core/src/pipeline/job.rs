//! One media item on its way through the pipeline.

use std::sync::Arc;
use tracing::warn;

use super::aggregator::BatchAggregator;
use super::types::{BuildOptions, BuildTarget};
use crate::media::{FrameRate, MediaId, MediaItem};
use crate::record::VersionRecord;

/// Describes one playlist entry to build.
///
/// A job finalizes exactly once against its batch: explicitly through
/// [`BuildJob::finish`], or on drop if it never got there (for example when
/// the task running it panicked). A dropped job still delivers its item if
/// the primary stage had built one.
pub(crate) struct BuildJob {
    id: MediaId,
    record: VersionRecord,
    rate: FrameRate,
    options: Arc<BuildOptions>,
    target: BuildTarget,
    aggregator: Arc<BatchAggregator>,
    artifact: Option<Arc<MediaItem>>,
    finished: bool,
}

impl BuildJob {
    pub(crate) fn new(
        id: MediaId,
        record: VersionRecord,
        rate: FrameRate,
        options: Arc<BuildOptions>,
        target: BuildTarget,
        aggregator: Arc<BatchAggregator>,
    ) -> Self {
        Self {
            id,
            record,
            rate,
            options,
            target,
            aggregator,
            artifact: None,
            finished: false,
        }
    }

    pub(crate) fn id(&self) -> MediaId {
        self.id
    }

    pub(crate) fn record(&self) -> &VersionRecord {
        &self.record
    }

    pub(crate) fn record_mut(&mut self) -> &mut VersionRecord {
        &mut self.record
    }

    pub(crate) fn rate(&self) -> FrameRate {
        self.rate
    }

    pub(crate) fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub(crate) fn target(&self) -> &BuildTarget {
        &self.target
    }

    pub(crate) fn batch_id(&self) -> uuid::Uuid {
        self.aggregator.batch_id()
    }

    /// Submission order of the job's batch.
    pub(crate) fn ordering(&self) -> &[MediaId] {
        self.aggregator.ordering()
    }

    /// The built item, once the primary stage succeeded.
    pub(crate) fn artifact(&self) -> Option<&Arc<MediaItem>> {
        self.artifact.as_ref()
    }

    pub(crate) fn set_artifact(&mut self, item: Arc<MediaItem>) {
        self.artifact = Some(item);
    }

    /// Finalizes the job, delivering its item if it has one.
    ///
    /// Returns true if this resolved the batch.
    pub(crate) fn finish(mut self) -> bool {
        self.finished = true;
        self.aggregator.finalize(self.id, self.artifact.take())
    }

    /// Finalizes the job as failed, dropping any item it built.
    pub(crate) fn fail(mut self) -> bool {
        self.artifact = None;
        self.finish()
    }
}

impl Drop for BuildJob {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                batch_id = %self.aggregator.batch_id(),
                media_id = %self.id,
                built = self.artifact.is_some(),
                "Job dropped before finalizing"
            );
            self.finished = true;
            self.aggregator.finalize(self.id, self.artifact.take());
        }
    }
}

impl std::fmt::Debug for BuildJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildJob")
            .field("id", &self.id)
            .field("record", &self.record.name())
            .field("rate", &self.rate)
            .field("built", &self.artifact.is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::aggregator::{BatchResult, BuildStats};
    use crate::testing::fixtures;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    /// Creates `n` jobs sharing one batch.
    pub(crate) fn batch(n: usize) -> (Vec<BuildJob>, oneshot::Receiver<BatchResult>) {
        let ids: Vec<MediaId> = (0..n).map(|_| MediaId::generate()).collect();
        let (aggregator, rx) =
            BatchAggregator::new(Uuid::new_v4(), ids.clone(), Arc::new(BuildStats::default()), None);
        let options = Arc::new(BuildOptions::default());

        let jobs = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                BuildJob::new(
                    id,
                    fixtures::version_record(i as i64, &format!("shot_{:03}", i)),
                    FrameRate::default(),
                    Arc::clone(&options),
                    BuildTarget::none(),
                    Arc::clone(&aggregator),
                )
            })
            .collect();
        (jobs, rx)
    }

    #[tokio::test]
    async fn test_finish_delivers_artifact() {
        let (mut jobs, rx) = batch(1);
        let mut job = jobs.remove(0);
        let item = Arc::new(MediaItem::new(job.id(), "shot_000", job.rate()));
        job.set_artifact(item);

        assert!(job.finish());
        assert_eq!(rx.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_drops_artifact() {
        let (mut jobs, rx) = batch(1);
        let mut job = jobs.remove(0);
        job.set_artifact(Arc::new(MediaItem::new(job.id(), "shot_000", job.rate())));

        assert!(job.fail());
        assert!(rx.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_finalizes_unfinished_jobs() {
        let (mut jobs, rx) = batch(2);
        let mut built = jobs.remove(0);
        let id = built.id();
        built.set_artifact(Arc::new(MediaItem::new(id, "shot_000", built.rate())));

        drop(built);
        drop(jobs);

        let result = rx.await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), id);
    }
}
