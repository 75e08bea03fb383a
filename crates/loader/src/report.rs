//! JSON report printed once a batch has been built.

use std::sync::Arc;

use serde::Serialize;

use playbuild_core::{BuilderStatus, MediaItem, MediaItemSnapshot, Playlist};

/// What the binary prints: the playlist and its media, in playlist order.
#[derive(Debug, Serialize)]
pub struct PlaylistReport {
    pub playlist: String,
    pub rate: f64,
    pub requested: usize,
    pub built: usize,
    pub media: Vec<MediaItemSnapshot>,
}

impl PlaylistReport {
    pub async fn collect(playlist: &Playlist, requested: usize, media: &[Arc<MediaItem>]) -> Self {
        let mut snapshots = Vec::with_capacity(media.len());
        for item in playlist.media().await {
            snapshots.push(item.snapshot().await);
        }

        Self {
            playlist: playlist.name().to_string(),
            rate: playlist.rate().fps(),
            requested,
            built: media.len(),
            media: snapshots,
        }
    }
}

/// One-line summary logged after the run.
pub fn summary(status: &BuilderStatus) -> String {
    format!(
        "{} built, {} failed across {} workers",
        status.total_built,
        status.total_failed,
        status.workers.len()
    )
}
