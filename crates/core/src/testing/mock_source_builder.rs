//! Mock source builder for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::media::{FrameRate, MediaKind, MediaSource};
use crate::record::VersionRecord;
use crate::source::{SourceBuilder, SourceError};

use super::activity::ActivityTracker;

/// Mock implementation of the SourceBuilder trait.
///
/// Every record gets a single "SG Movie" source unless configured otherwise.
/// Behavior is keyed by record name (for building) and source name (for
/// validation):
/// - Per-record build latency, empty results, failures and panics
/// - Per-source validation outcomes
/// - Records released sources and build completion order
/// - Tracks the peak number of concurrent builds and validations, optionally
///   together with other mocks through a shared [`ActivityTracker`]
///
/// # Example
///
/// ```rust,ignore
/// use playbuild_core::testing::MockSourceBuilder;
///
/// let builder = MockSourceBuilder::new();
/// builder.set_latency("shot_010", Duration::from_millis(50)).await;
/// builder.set_invalid("broken.mov").await;
///
/// // ... run a batch ...
///
/// assert_eq!(builder.released_names().await, vec!["broken.mov"]);
/// ```
#[derive(Debug, Default)]
pub struct MockSourceBuilder {
    latencies: Arc<RwLock<HashMap<String, Duration>>>,
    empty: Arc<RwLock<HashSet<String>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    panicking: Arc<RwLock<HashSet<String>>>,
    invalid: Arc<RwLock<HashSet<String>>>,
    validation_errors: Arc<RwLock<HashSet<String>>>,
    released: Arc<RwLock<Vec<MediaSource>>>,
    completed: Arc<RwLock<Vec<String>>>,
    activity: ActivityTracker,
}

impl MockSourceBuilder {
    /// Create a new mock source builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count builds and validations on a tracker shared with other mocks.
    pub fn with_activity(mut self, activity: ActivityTracker) -> Self {
        self.activity = activity;
        self
    }

    /// The tracker counting this builder's calls.
    pub fn activity(&self) -> ActivityTracker {
        self.activity.clone()
    }

    /// Delay building sources for the named record.
    pub async fn set_latency(&self, record: &str, latency: Duration) {
        self.latencies
            .write()
            .await
            .insert(record.to_string(), latency);
    }

    /// Build no sources for the named record.
    pub async fn set_empty(&self, record: &str) {
        self.empty.write().await.insert(record.to_string());
    }

    /// Fail building sources for the named record.
    pub async fn set_failing(&self, record: &str) {
        self.failing.write().await.insert(record.to_string());
    }

    /// Panic while building sources for the named record.
    pub async fn set_panicking(&self, record: &str) {
        self.panicking.write().await.insert(record.to_string());
    }

    /// Make validation of the named source return false.
    pub async fn set_invalid(&self, source: &str) {
        self.invalid.write().await.insert(source.to_string());
    }

    /// Make validation of the named source return an error.
    pub async fn set_validation_error(&self, source: &str) {
        self.validation_errors.write().await.insert(source.to_string());
    }

    /// Names of released sources, in release order.
    pub async fn released_names(&self) -> Vec<String> {
        self.released
            .read()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// How many times the named source was released.
    pub async fn release_count(&self, source: &str) -> usize {
        self.released
            .read()
            .await
            .iter()
            .filter(|s| s.name == source)
            .count()
    }

    /// Record names in the order their builds finished.
    pub async fn completion_order(&self) -> Vec<String> {
        self.completed.read().await.clone()
    }

    /// Highest number of tracked calls that ran at once.
    pub fn peak_concurrency(&self) -> usize {
        self.activity.peak()
    }
}

#[async_trait]
impl SourceBuilder for MockSourceBuilder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn build_sources(
        &self,
        record: &VersionRecord,
        _rate: FrameRate,
    ) -> Result<Vec<MediaSource>, SourceError> {
        let name = record.name();

        let active = self.activity.enter();

        let latency = self.latencies.read().await.get(&name).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        drop(active);
        self.completed.write().await.push(name.clone());

        if self.panicking.read().await.contains(&name) {
            panic!("mock panic while building {}", name);
        }
        if self.failing.read().await.contains(&name) {
            return Err(SourceError::Unavailable(format!("mock failure for {}", name)));
        }
        if self.empty.read().await.contains(&name) {
            return Ok(Vec::new());
        }

        Ok(vec![MediaSource::new(
            "SG Movie",
            format!("file:///shows/mock/{}.mov", name),
            vec![MediaKind::Image, MediaKind::Audio],
        )])
    }

    async fn validate_source(
        &self,
        source: &MediaSource,
        _rate: FrameRate,
    ) -> Result<bool, SourceError> {
        let _active = self.activity.enter();
        tokio::task::yield_now().await;
        if self.validation_errors.read().await.contains(&source.name) {
            return Err(SourceError::detail_failed(format!("mock detail failure for {}", source.name)));
        }
        Ok(!self.invalid.read().await.contains(&source.name))
    }

    async fn release_source(&self, source: MediaSource) {
        self.released.write().await.push(source);
    }
}
