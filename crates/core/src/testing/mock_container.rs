//! Mock media container for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::{ContainerError, FrameRate, MediaContainer, MediaId, MediaItem};

/// A recorded insert for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedInsert {
    pub item: Arc<MediaItem>,
    pub ordering: Vec<MediaId>,
    pub before: Option<MediaId>,
}

/// Mock implementation of the MediaContainer trait.
///
/// Records inserts in arrival order and can refuse items by name.
#[derive(Debug)]
pub struct MockContainer {
    name: String,
    rate: Arc<RwLock<Option<FrameRate>>>,
    inserts: Arc<RwLock<Vec<RecordedInsert>>>,
    rejected: Arc<RwLock<HashSet<String>>>,
}

impl MockContainer {
    /// Create a new mock container with a 24fps rate.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rate: Arc::new(RwLock::new(Some(FrameRate::default()))),
            inserts: Arc::new(RwLock::new(Vec::new())),
            rejected: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Set the media rate. `None` makes the rate lookup fail.
    pub async fn set_rate(&self, rate: Option<FrameRate>) {
        *self.rate.write().await = rate;
    }

    /// Refuse items with this name.
    pub async fn reject_name(&self, name: &str) {
        self.rejected.write().await.insert(name.to_string());
    }

    /// All accepted inserts, in arrival order.
    pub async fn recorded_inserts(&self) -> Vec<RecordedInsert> {
        self.inserts.read().await.clone()
    }

    /// Names of accepted items, in arrival order.
    pub async fn inserted_names(&self) -> Vec<String> {
        self.inserts
            .read()
            .await
            .iter()
            .map(|i| i.item.name().to_string())
            .collect()
    }
}

#[async_trait]
impl MediaContainer for MockContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn media_rate(&self) -> Result<FrameRate, ContainerError> {
        (*self.rate.read().await)
            .ok_or_else(|| ContainerError::Unavailable("mock container has no rate".to_string()))
    }

    async fn insert(
        &self,
        item: Arc<MediaItem>,
        ordering: &[MediaId],
        before: Option<MediaId>,
    ) -> Result<(), ContainerError> {
        if self.rejected.read().await.contains(item.name()) {
            return Err(ContainerError::rejected(format!("{} refused", item.name())));
        }

        self.inserts.write().await.push(RecordedInsert {
            item,
            ordering: ordering.to_vec(),
            before,
        });
        Ok(())
    }
}
