//! In-memory playlist container.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::error::ContainerError;
use super::item::MediaItem;
use super::traits::MediaContainer;
use super::types::{FrameRate, MediaId};

/// An ordered list of media items.
#[derive(Debug)]
pub struct Playlist {
    id: Uuid,
    name: String,
    rate: FrameRate,
    media: RwLock<Vec<Arc<MediaItem>>>,
}

impl Playlist {
    /// Creates an empty playlist.
    pub fn new(name: impl Into<String>, rate: FrameRate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rate,
            media: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Returns the media items in playlist order.
    pub async fn media(&self) -> Vec<Arc<MediaItem>> {
        self.media.read().await.clone()
    }

    /// Returns the media ids in playlist order.
    pub async fn media_ids(&self) -> Vec<MediaId> {
        self.media.read().await.iter().map(|m| m.id()).collect()
    }

    pub async fn len(&self) -> usize {
        self.media.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.media.read().await.is_empty()
    }
}

/// Works out where `new` goes in `existing`.
///
/// Walks `ordering` forward from `new` and returns the position of the first
/// later id already present. Otherwise the position of `before`, otherwise
/// the end.
pub(crate) fn insertion_index(
    existing: &[MediaId],
    new: MediaId,
    ordering: &[MediaId],
    before: Option<MediaId>,
) -> usize {
    let later = ordering
        .iter()
        .skip_while(|id| **id != new)
        .skip(1)
        .find_map(|id| existing.iter().position(|e| e == id));

    later
        .or_else(|| before.and_then(|b| existing.iter().position(|e| *e == b)))
        .unwrap_or(existing.len())
}

#[async_trait]
impl MediaContainer for Playlist {
    fn name(&self) -> &str {
        &self.name
    }

    async fn media_rate(&self) -> Result<FrameRate, ContainerError> {
        Ok(self.rate)
    }

    async fn insert(
        &self,
        item: Arc<MediaItem>,
        ordering: &[MediaId],
        before: Option<MediaId>,
    ) -> Result<(), ContainerError> {
        let mut media = self.media.write().await;
        let ids: Vec<MediaId> = media.iter().map(|m| m.id()).collect();

        if ids.contains(&item.id()) {
            return Err(ContainerError::DuplicateMedia(item.id()));
        }

        let index = insertion_index(&ids, item.id(), ordering, before);
        debug!(
            playlist = %self.name,
            media_id = %item.id(),
            index,
            "Inserting media into playlist"
        );
        media.insert(index, item);
        Ok(())
    }
}
