//! Worker pool and the stage bodies it runs.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::dispatcher::DispatchCommand;
use super::job::BuildJob;
use super::types::{Stage, WorkerStatus};
use crate::events::{EventHandle, PipelineEvent, SkipReason};
use crate::media::MediaItem;
use crate::metrics;
use crate::source::{SourceBuilder, SourceError, SupplementaryLookup, SupplementarySource};

/// Collaborators shared by every worker.
pub(crate) struct StageContext {
    pub(crate) sources: Arc<dyn SourceBuilder>,
    pub(crate) supplementary: Option<Arc<dyn SupplementarySource>>,
    pub(crate) default_names: Vec<String>,
    pub(crate) events: Option<EventHandle>,
}

impl StageContext {
    fn emit(&self, event: PipelineEvent) {
        if let Some(ref events) = self.events {
            events.try_emit(event);
        }
    }
}

/// Fixed set of stateless workers, picked round-robin.
pub(crate) struct WorkerPool {
    ctx: Arc<StageContext>,
    dispatched: Vec<u64>,
    next: usize,
}

impl WorkerPool {
    pub(crate) fn new(size: usize, ctx: Arc<StageContext>) -> Self {
        Self {
            ctx,
            dispatched: vec![0; size.max(1)],
            next: 0,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.dispatched.len()
    }

    pub(crate) fn status(&self) -> Vec<WorkerStatus> {
        self.dispatched
            .iter()
            .enumerate()
            .map(|(index, &dispatched)| WorkerStatus { index, dispatched })
            .collect()
    }

    /// Runs one stage of `job` on the next worker.
    ///
    /// Completion is always reported back on `done`, including when the
    /// stage panics. Returns the worker index used.
    pub(crate) fn dispatch(
        &mut self,
        stage: Stage,
        job: BuildJob,
        done: mpsc::Sender<DispatchCommand>,
    ) -> usize {
        let worker = self.next;
        self.next = (self.next + 1) % self.dispatched.len();
        self.dispatched[worker] += 1;

        metrics::STAGE_DISPATCHES
            .with_label_values(&[stage.as_str()])
            .inc();
        debug!(
            batch_id = %job.batch_id(),
            media_id = %job.id(),
            %stage,
            worker,
            "Dispatching stage"
        );

        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move {
            let media_id = job.id();
            let handle = tokio::spawn(run_stage(ctx, stage, job));
            let next = match handle.await {
                Ok(next) => next,
                Err(e) => {
                    error!(%media_id, %stage, worker, "Stage task failed: {}", e);
                    None
                }
            };

            if done
                .send(DispatchCommand::StageComplete { stage, next })
                .await
                .is_err()
            {
                warn!(%media_id, %stage, "Dispatcher gone, stage completion lost");
            }
        });

        worker
    }
}

/// Runs a stage. Returns the job if it moves on to the secondary queue.
async fn run_stage(ctx: Arc<StageContext>, stage: Stage, job: BuildJob) -> Option<BuildJob> {
    match stage {
        Stage::Primary => build_primary(&ctx, job).await,
        Stage::Secondary => {
            augment(&ctx, job).await;
            None
        }
    }
}

/// Builds the media item from the job's record.
///
/// Fails the job when the builder errors or produces no sources, or when the
/// target container refuses the item.
pub(crate) async fn build_primary(ctx: &StageContext, mut job: BuildJob) -> Option<BuildJob> {
    job.record_mut().normalize_media_paths();

    let sources = match ctx.sources.build_sources(job.record(), job.rate()).await {
        Ok(sources) if sources.is_empty() => {
            fail_primary(ctx, job, "no sources built".to_string(), false);
            return None;
        }
        Ok(sources) => sources,
        Err(e) => {
            fail_primary(ctx, job, e.to_string(), e.is_retryable());
            return None;
        }
    };

    let item = Arc::new(MediaItem::new(job.id(), job.record().name(), job.rate()));
    let source_count = item.add_sources(sources).await;
    item.set_metadata("version", job.record().as_json().clone()).await;
    {
        let options = job.options();
        item.apply_default_sources(
            &options.preferred_visual_sources,
            &options.preferred_audio_sources,
            &ctx.default_names,
        )
        .await;
    }

    if let Some(container) = job.target().container.clone() {
        let before = job.target().insert_before;
        if let Err(e) = container
            .insert(Arc::clone(&item), job.ordering(), before)
            .await
        {
            // The item is dropped, so its sources go back to the builder.
            join_all(
                item.sources()
                    .await
                    .into_iter()
                    .map(|source| ctx.sources.release_source(source)),
            )
            .await;
            fail_primary(
                ctx,
                job,
                format!("insert into {} failed: {}", container.name(), e),
                e.is_retryable(),
            );
            return None;
        }
    }

    if let Some(flag) = job.options().flag.clone() {
        item.set_flag(flag).await;
    }

    info!(
        batch_id = %job.batch_id(),
        media_id = %job.id(),
        name = %item.name(),
        source_count,
        "Media built"
    );
    ctx.emit(PipelineEvent::MediaBuilt {
        batch_id: job.batch_id(),
        media_id: job.id(),
        name: item.name().to_string(),
        source_count,
    });

    job.set_artifact(item);
    Some(job)
}

fn fail_primary(ctx: &StageContext, job: BuildJob, error: String, retryable: bool) {
    warn!(
        batch_id = %job.batch_id(),
        media_id = %job.id(),
        record = %job.record().name(),
        retryable,
        "Primary build failed: {}",
        error
    );
    ctx.emit(PipelineEvent::MediaFailed {
        batch_id: job.batch_id(),
        media_id: job.id(),
        stage: Stage::Primary,
        error,
    });
    job.fail();
}

/// Adds validated supplementary sources to a built item, then finalizes.
///
/// Never fails the job: whatever happens here, the item built by the
/// primary stage is delivered.
pub(crate) async fn augment(ctx: &StageContext, job: BuildJob) {
    let Some(item) = job.artifact().cloned() else {
        job.finish();
        return;
    };

    let Some(supplementary) = ctx.supplementary.clone() else {
        skip_augmentation(ctx, &job, SkipReason::Disabled, None);
        job.finish();
        return;
    };

    let Some(lookup) = SupplementaryLookup::from_record(job.record()) else {
        skip_augmentation(ctx, &job, SkipReason::NoLookup, None);
        job.finish();
        return;
    };

    let candidates = match supplementary.fetch_sources(&lookup, job.rate()).await {
        Ok(candidates) if candidates.is_empty() => {
            skip_augmentation(ctx, &job, SkipReason::Empty, None);
            job.finish();
            return;
        }
        Ok(candidates) => candidates,
        Err(e) => {
            let reason = match &e {
                SourceError::Unavailable(_) => SkipReason::Unavailable,
                _ => SkipReason::Error,
            };
            skip_augmentation(ctx, &job, reason, Some(&e));
            job.finish();
            return;
        }
    };

    let rate = job.rate();
    let checks = join_all(candidates.into_iter().map(|source| {
        let sources = Arc::clone(&ctx.sources);
        async move {
            let outcome = sources.validate_source(&source, rate).await;
            (source, outcome)
        }
    }))
    .await;

    let mut survivors = Vec::new();
    let mut rejected = Vec::new();
    for (source, outcome) in checks {
        match outcome {
            Ok(true) => survivors.push(source),
            Ok(false) => {
                metrics::SOURCES_DISCARDED.with_label_values(&["invalid"]).inc();
                rejected.push((source, None));
            }
            Err(e) => {
                metrics::SOURCES_DISCARDED.with_label_values(&["error"]).inc();
                debug!(
                    media_id = %job.id(),
                    source = %source.name,
                    retryable = e.is_retryable(),
                    "Source validation failed: {}",
                    e
                );
                rejected.push((source, Some(e.to_string())));
            }
        }
    }

    // Each rejected source is released exactly once and never attached.
    join_all(rejected.into_iter().map(|(source, error)| {
        debug!(media_id = %job.id(), source = %source.name, "Discarding source");
        ctx.emit(PipelineEvent::SourceDiscarded {
            batch_id: job.batch_id(),
            media_id: job.id(),
            source_name: source.name.clone(),
            error,
        });
        ctx.sources.release_source(source)
    }))
    .await;

    if !survivors.is_empty() {
        let added = survivors.len();
        item.add_sources(survivors).await;
        let options = job.options();
        item.apply_default_sources(
            &options.preferred_visual_sources,
            &options.preferred_audio_sources,
            &ctx.default_names,
        )
        .await;

        metrics::SOURCES_ATTACHED
            .with_label_values(&[Stage::Secondary.as_str()])
            .inc_by(added as u64);
        debug!(media_id = %job.id(), added, "Augmented media");
        ctx.emit(PipelineEvent::SourcesAugmented {
            batch_id: job.batch_id(),
            media_id: job.id(),
            added,
        });
    }

    job.finish();
}

fn skip_augmentation(
    ctx: &StageContext,
    job: &BuildJob,
    reason: SkipReason,
    error: Option<&SourceError>,
) {
    metrics::AUGMENTATION_SKIPPED
        .with_label_values(&[reason.as_str()])
        .inc();
    match error {
        Some(e) => warn!(
            media_id = %job.id(),
            reason = reason.as_str(),
            retryable = e.is_retryable(),
            "Augmentation skipped: {}",
            e
        ),
        None => debug!(media_id = %job.id(), reason = reason.as_str(), "Augmentation skipped"),
    }
    ctx.emit(PipelineEvent::AugmentationSkipped {
        batch_id: job.batch_id(),
        media_id: job.id(),
        reason,
        error: error.map(ToString::to_string),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaKind, MediaSource};
    use crate::pipeline::job::tests::batch;
    use crate::testing::{MockSourceBuilder, MockSupplementarySource};

    fn context(
        sources: Arc<MockSourceBuilder>,
        supplementary: Option<Arc<MockSupplementarySource>>,
    ) -> StageContext {
        StageContext {
            sources,
            supplementary: supplementary.map(|s| s as Arc<dyn SupplementarySource>),
            default_names: vec!["movie_dneg".to_string(), "SG Movie".to_string()],
            events: None,
        }
    }

    #[test]
    fn test_pool_has_at_least_one_worker() {
        let ctx = Arc::new(context(Arc::new(MockSourceBuilder::new()), None));
        let pool = WorkerPool::new(0, ctx);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.status()[0].dispatched, 0);
    }

    #[tokio::test]
    async fn test_dispatch_round_robin_and_reports_completion() {
        let ctx = Arc::new(context(Arc::new(MockSourceBuilder::new()), None));
        let mut pool = WorkerPool::new(2, ctx);
        let (tx, mut rx) = mpsc::channel(8);
        let (jobs, _batch) = batch(3);

        let workers: Vec<usize> = jobs
            .into_iter()
            .map(|job| pool.dispatch(Stage::Primary, job, tx.clone()))
            .collect();
        assert_eq!(workers, vec![0, 1, 0]);
        assert_eq!(pool.status()[0].dispatched, 2);

        for _ in 0..3 {
            match rx.recv().await.unwrap() {
                DispatchCommand::StageComplete { stage, next } => {
                    assert_eq!(stage, Stage::Primary);
                    assert!(next.is_some());
                }
                _ => panic!("unexpected command"),
            }
        }
    }

    #[tokio::test]
    async fn test_primary_builds_item() {
        let builder = Arc::new(MockSourceBuilder::new());
        let ctx = context(Arc::clone(&builder), None);
        let (mut jobs, _rx) = batch(1);

        let job = build_primary(&ctx, jobs.remove(0)).await.unwrap();
        let item = job.artifact().unwrap();
        assert_eq!(item.name(), "shot_000");
        assert_eq!(item.source_count().await, 1);
        assert!(item.metadata("version").await.is_some());
        assert_eq!(
            item.default_source(MediaKind::Image).await.unwrap().name,
            "SG Movie"
        );
        job.finish();
    }

    #[tokio::test]
    async fn test_primary_without_sources_fails() {
        let builder = Arc::new(MockSourceBuilder::new());
        builder.set_empty("shot_000").await;
        let ctx = context(Arc::clone(&builder), None);
        let (mut jobs, rx) = batch(1);

        assert!(build_primary(&ctx, jobs.remove(0)).await.is_none());
        assert!(rx.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_augment_discards_invalid_sources() {
        let builder = Arc::new(MockSourceBuilder::new());
        builder.set_invalid("bad.mov").await;
        let supplementary = Arc::new(MockSupplementarySource::new());
        supplementary
            .set_sources(
                "ext-0",
                vec![
                    MediaSource::new("movie_dneg", "file:///good.mov", vec![MediaKind::Image, MediaKind::Audio]),
                    MediaSource::new("bad.mov", "file:///bad.mov", vec![MediaKind::Image]),
                ],
            )
            .await;
        let ctx = context(Arc::clone(&builder), Some(supplementary));
        let (mut jobs, rx) = batch(1);

        let job = build_primary(&ctx, jobs.remove(0)).await.unwrap();
        augment(&ctx, job).await;

        let result = rx.await.unwrap();
        let item = &result[0];
        assert_eq!(item.source_count().await, 2);
        assert_eq!(
            item.default_source(MediaKind::Image).await.unwrap().name,
            "movie_dneg"
        );
        assert_eq!(builder.released_names().await, vec!["bad.mov".to_string()]);
    }

    #[tokio::test]
    async fn test_augment_failure_keeps_item() {
        let builder = Arc::new(MockSourceBuilder::new());
        let supplementary = Arc::new(MockSupplementarySource::new());
        supplementary.set_fail_all(true).await;
        let (events, mut event_rx) = EventHandle::channel(16);
        let ctx = StageContext {
            events: Some(events),
            ..context(Arc::clone(&builder), Some(supplementary))
        };
        let (mut jobs, rx) = batch(1);

        let job = build_primary(&ctx, jobs.remove(0)).await.unwrap();
        augment(&ctx, job).await;

        let result = rx.await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source_count().await, 1);
        assert!(builder.released_names().await.is_empty());

        let mut skipped = None;
        while let Ok(envelope) = event_rx.try_recv() {
            if let PipelineEvent::AugmentationSkipped { reason, error, .. } = envelope.event {
                skipped = Some((reason, error));
            }
        }
        let (reason, error) = skipped.unwrap();
        assert_eq!(reason, SkipReason::Unavailable);
        assert!(error.unwrap().contains("mock supplementary source down"));
    }
}
