//! Mock supplementary source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::media::{FrameRate, MediaSource};
use crate::source::{SourceError, SupplementaryLookup, SupplementarySource};

use super::activity::ActivityTracker;

/// Mock implementation of the SupplementarySource trait.
///
/// Serves pre-configured candidates by external id and records every
/// lookup. Unknown ids have no candidates. Lookups can be slowed down and
/// counted on an [`ActivityTracker`] shared with the source builder.
#[derive(Debug, Default)]
pub struct MockSupplementarySource {
    sources: Arc<RwLock<HashMap<String, Vec<MediaSource>>>>,
    lookups: Arc<RwLock<Vec<SupplementaryLookup>>>,
    fail_all: Arc<RwLock<bool>>,
    latency: Arc<RwLock<Option<Duration>>>,
    activity: ActivityTracker,
}

impl MockSupplementarySource {
    /// Create a new mock supplementary source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count lookups on a tracker shared with other mocks.
    pub fn with_activity(mut self, activity: ActivityTracker) -> Self {
        self.activity = activity;
        self
    }

    /// Delay every lookup.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    /// Set the candidates returned for an external id.
    pub async fn set_sources(&self, external_id: &str, sources: Vec<MediaSource>) {
        self.sources
            .write()
            .await
            .insert(external_id.to_string(), sources);
    }

    /// Make every lookup fail as unreachable.
    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// All lookups performed.
    pub async fn recorded_lookups(&self) -> Vec<SupplementaryLookup> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl SupplementarySource for MockSupplementarySource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_sources(
        &self,
        lookup: &SupplementaryLookup,
        _rate: FrameRate,
    ) -> Result<Vec<MediaSource>, SourceError> {
        let _active = self.activity.enter();
        self.lookups.write().await.push(lookup.clone());

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if *self.fail_all.read().await {
            return Err(SourceError::Unavailable("mock supplementary source down".to_string()));
        }

        Ok(self
            .sources
            .read()
            .await
            .get(&lookup.external_id)
            .cloned()
            .unwrap_or_default())
    }
}
