//! Trait definitions for destination containers.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::ContainerError;
use super::item::MediaItem;
use super::types::{FrameRate, MediaId};

/// A destination playlist (or any ordered container) for built media.
#[async_trait]
pub trait MediaContainer: Send + Sync {
    /// Returns the name of this container.
    fn name(&self) -> &str;

    /// Returns the rate media should be built at for this container.
    async fn media_rate(&self) -> Result<FrameRate, ContainerError>;

    /// Inserts a media item.
    ///
    /// `ordering` is the full submission order of the batch the item belongs
    /// to. Items arrive out of order, so the container must place `item`
    /// before the first later item of the batch it already holds, falling
    /// back to `before` (or the end) when there is none.
    async fn insert(
        &self,
        item: Arc<MediaItem>,
        ordering: &[MediaId],
        before: Option<MediaId>,
    ) -> Result<(), ContainerError>;
}
