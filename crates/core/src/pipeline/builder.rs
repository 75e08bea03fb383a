//! The public face of the pipeline.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use super::aggregator::{BatchAggregator, BatchResult, BuildStats};
use super::config::PipelineConfig;
use super::dispatcher::{DispatchCommand, Dispatcher, QueueSnapshot};
use super::error::PipelineError;
use super::job::BuildJob;
use super::types::{BuildOptions, BuildTarget, BuilderStatus, WorkerStatus};
use super::worker::{StageContext, WorkerPool};
use crate::events::{EventHandle, PipelineEvent};
use crate::media::{FrameRate, MediaId, MediaItem};
use crate::metrics;
use crate::record::{extract_version_records, PayloadContext, VersionRecord};
use crate::source::{SourceBuilder, SupplementarySource};

/// A submitted batch that has not been collected yet.
///
/// Dropping it abandons the result; the work itself still runs to
/// completion.
#[derive(Debug)]
pub struct PendingBatch {
    batch_id: Uuid,
    media_ids: Vec<MediaId>,
    rx: oneshot::Receiver<BatchResult>,
}

impl PendingBatch {
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Identities assigned to the batch's items, in submission order.
    pub fn media_ids(&self) -> &[MediaId] {
        &self.media_ids
    }

    pub fn len(&self) -> usize {
        self.media_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media_ids.is_empty()
    }

    /// Waits for every item to finish.
    ///
    /// Resolves with the successfully built items in submission order.
    pub async fn wait(self) -> Result<Vec<Arc<MediaItem>>, PipelineError> {
        self.rx.await.map_err(|_| PipelineError::BatchDropped)
    }
}

/// Builds playlist media from metadata records.
///
/// Work is bounded by `worker_count` concurrently dispatched stages across
/// all batches. Each record goes through a primary stage that builds the
/// item and a secondary stage that augments it with supplementary sources.
pub struct PlaylistBuilder {
    config: PipelineConfig,
    sources: Arc<dyn SourceBuilder>,
    supplementary: Option<Arc<dyn SupplementarySource>>,
    events: Option<EventHandle>,
    commands: mpsc::Sender<DispatchCommand>,
    pending_rx: Mutex<Option<mpsc::Receiver<DispatchCommand>>>,
    /// Dropped with the builder, which tells the dispatch loop to finish.
    shutdown: watch::Sender<()>,
    started: AtomicBool,
    running: Arc<RwLock<bool>>,
    stats: Arc<BuildStats>,
}

impl PlaylistBuilder {
    /// Creates a stopped builder.
    pub fn new(config: PipelineConfig, sources: Arc<dyn SourceBuilder>) -> Self {
        let (commands, rx) = mpsc::channel(config.command_buffer.max(1));
        let (shutdown, _) = watch::channel(());
        Self {
            config,
            sources,
            supplementary: None,
            events: None,
            commands,
            pending_rx: Mutex::new(Some(rx)),
            shutdown,
            started: AtomicBool::new(false),
            running: Arc::new(RwLock::new(false)),
            stats: Arc::new(BuildStats::default()),
        }
    }

    /// Sets the supplementary source used to augment built items.
    pub fn with_supplementary(mut self, supplementary: Arc<dyn SupplementarySource>) -> Self {
        self.supplementary = Some(supplementary);
        self
    }

    /// Sets the event handle for publishing build events.
    pub fn with_events(mut self, events: EventHandle) -> Self {
        self.events = Some(events);
        self
    }

    /// Starts the builder. The dispatch loop is spawned on first start.
    pub async fn start(&self) {
        let rx = self
            .pending_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(rx) = rx {
            let ctx = Arc::new(StageContext {
                sources: Arc::clone(&self.sources),
                supplementary: self.supplementary.clone(),
                default_names: self.config.default_source_names.clone(),
                events: self.events.clone(),
            });
            let pool = WorkerPool::new(self.config.worker_count, ctx);
            let dispatcher = Dispatcher::new(
                pool,
                rx,
                self.commands.clone(),
                self.shutdown.subscribe(),
                self.config.dispatch_delay(),
            );
            tokio::spawn(dispatcher.run());
            self.started.store(true, Ordering::Release);

            info!(
                workers = self.config.worker_count,
                sources = self.sources.name(),
                supplementary = self.supplementary.as_ref().map(|s| s.name()).unwrap_or("none"),
                "Playlist builder started"
            );
        }

        *self.running.write().await = true;
    }

    /// Stops accepting submissions. Work already submitted completes.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    /// Rate used when neither the caller nor the container gives one.
    pub fn default_rate(&self) -> FrameRate {
        FrameRate::from_fps(self.config.default_rate)
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Returns the current builder status.
    pub async fn status(&self) -> BuilderStatus {
        let running = self.is_running().await;

        let snapshot = if self.started.load(Ordering::Acquire) {
            let (tx, rx) = oneshot::channel();
            match self.commands.send(DispatchCommand::Status(tx)).await {
                Ok(()) => rx.await.ok(),
                Err(_) => None,
            }
        } else {
            None
        };

        let snapshot = snapshot.unwrap_or_else(|| {
            let capacity = self.config.worker_count.max(1);
            QueueSnapshot {
                capacity,
                in_flight: 0,
                primary_queued: 0,
                secondary_queued: 0,
                workers: (0..capacity)
                    .map(|index| WorkerStatus {
                        index,
                        dispatched: 0,
                    })
                    .collect(),
            }
        });

        BuilderStatus {
            running,
            capacity: snapshot.capacity,
            in_flight: snapshot.in_flight,
            primary_queued: snapshot.primary_queued,
            secondary_queued: snapshot.secondary_queued,
            total_built: self.stats.total_built.load(Ordering::Relaxed),
            total_failed: self.stats.total_failed.load(Ordering::Relaxed),
            workers: snapshot.workers,
        }
    }

    /// Submits a batch of records.
    ///
    /// Returns once the batch is queued. Items that fail to build are left
    /// out of the result; the batch itself never fails.
    pub async fn submit(
        &self,
        records: Vec<VersionRecord>,
        target: BuildTarget,
        options: BuildOptions,
    ) -> Result<PendingBatch, PipelineError> {
        if !self.is_running().await {
            return Err(PipelineError::NotRunning);
        }

        let rate = self.resolve_rate(&options, &target).await;
        let batch_id = Uuid::new_v4();
        let media_ids: Vec<MediaId> = records.iter().map(|_| MediaId::generate()).collect();

        metrics::BATCHES_SUBMITTED.with_label_values(&[]).inc();
        info!(
            %batch_id,
            media_count = media_ids.len(),
            %rate,
            container = target.container.as_ref().map(|c| c.name()).unwrap_or("none"),
            "Batch submitted"
        );
        if let Some(ref events) = self.events {
            events.try_emit(PipelineEvent::BatchSubmitted {
                batch_id,
                media_count: media_ids.len(),
            });
        }

        let (aggregator, rx) = BatchAggregator::new(
            batch_id,
            media_ids.clone(),
            Arc::clone(&self.stats),
            self.events.clone(),
        );

        let options = Arc::new(options);
        let jobs: Vec<BuildJob> = records
            .into_iter()
            .zip(media_ids.iter().copied())
            .map(|(record, id)| {
                BuildJob::new(
                    id,
                    record,
                    rate,
                    Arc::clone(&options),
                    target.clone(),
                    Arc::clone(&aggregator),
                )
            })
            .collect();

        if !jobs.is_empty()
            && self
                .commands
                .send(DispatchCommand::Submit(jobs))
                .await
                .is_err()
        {
            return Err(PipelineError::NotRunning);
        }

        Ok(PendingBatch {
            batch_id,
            media_ids,
            rx,
        })
    }

    /// Submits the versions found in a query payload.
    ///
    /// Source preferences and the flag come from the payload's `context`.
    pub async fn submit_payload(
        &self,
        payload: &Value,
        target: BuildTarget,
    ) -> Result<PendingBatch, PipelineError> {
        let records = extract_version_records(payload)?;
        let options = BuildOptions::from_context(PayloadContext::from_payload(payload));
        self.submit(records, target, options).await
    }

    /// Explicit rate, else the container's, else the configured default.
    async fn resolve_rate(&self, options: &BuildOptions, target: &BuildTarget) -> FrameRate {
        if let Some(rate) = options.rate {
            return rate;
        }

        if let Some(ref container) = target.container {
            match container.media_rate().await {
                Ok(rate) => return rate,
                Err(e) => warn!(
                    container = container.name(),
                    "Could not read container rate, using default: {}", e
                ),
            }
        }

        self.default_rate()
    }
}
