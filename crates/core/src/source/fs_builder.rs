//! Filesystem-backed source builder.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::config::SourceConfig;
use super::error::SourceError;
use super::traits::SourceBuilder;
use crate::media::{FrameRate, MediaKind, MediaSource};
use crate::record::VersionRecord;

/// Builds sources from the movie and frames paths of a version record.
///
/// A movie becomes one source providing image and audio, a frame sequence
/// one image-only source. Detail is acquired by inspecting the filesystem;
/// sources whose detail can't be read are still returned so broken media
/// stays visible.
#[derive(Debug, Clone, Default)]
pub struct FsSourceBuilder {
    config: SourceConfig,
}

impl FsSourceBuilder {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Path on disk that must exist for the media to be readable.
    ///
    /// For frame patterns (`comp.####.exr`) that is the containing directory.
    fn probe_path(path: &Path) -> PathBuf {
        if path.to_string_lossy().contains('#') {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            path.to_path_buf()
        }
    }

    async fn acquire_detail(path: &Path) -> Result<(), SourceError> {
        let probe = Self::probe_path(path);
        match tokio::fs::metadata(&probe).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SourceError::NotFound { path: probe })
            }
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}

/// Converts a posix path to a `file://` URI.
pub fn path_to_uri(path: &str) -> String {
    format!("file://{}", path)
}

/// Converts a `file://` URI (or bare path) back to a path.
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

#[async_trait]
impl SourceBuilder for FsSourceBuilder {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn build_sources(
        &self,
        record: &VersionRecord,
        _rate: FrameRate,
    ) -> Result<Vec<MediaSource>, SourceError> {
        let mut sources = Vec::new();

        if let Some(movie) = record.movie_path() {
            if let Err(e) = Self::acquire_detail(Path::new(movie)).await {
                warn!(record = %record.name(), "Movie detail unavailable: {}", e);
            }
            sources.push(MediaSource::new(
                self.config.movie_source_name.clone(),
                path_to_uri(movie),
                vec![MediaKind::Image, MediaKind::Audio],
            ));
        }

        if let Some(frames) = record.frames_path() {
            if let Err(e) = Self::acquire_detail(Path::new(frames)).await {
                warn!(record = %record.name(), "Frames detail unavailable: {}", e);
            }
            let mut source = MediaSource::new(
                self.config.frames_source_name.clone(),
                path_to_uri(frames),
                vec![MediaKind::Image],
            );
            if let Some(range) = record.frame_range() {
                source = source.with_frame_range(range);
            }
            sources.push(source);
        }

        debug!(record = %record.name(), count = sources.len(), "Built sources");
        Ok(sources)
    }

    async fn validate_source(
        &self,
        source: &MediaSource,
        _rate: FrameRate,
    ) -> Result<bool, SourceError> {
        match Self::acquire_detail(&uri_to_path(&source.uri)).await {
            Ok(()) => Ok(true),
            Err(SourceError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn release_source(&self, source: MediaSource) {
        debug!(source = %source.name, uri = %source.uri, "Releasing source");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(movie: Option<&str>, frames: Option<&str>) -> VersionRecord {
        VersionRecord::from_json(json!({
            "id": 1,
            "attributes": {
                "code": "abc_0010",
                "sg_path_to_movie": movie,
                "sg_path_to_frames": frames,
                "frame_range": "1001-1010"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_uri_conversion() {
        assert_eq!(path_to_uri("/shows/a.mov"), "file:///shows/a.mov");
        assert_eq!(uri_to_path("file:///shows/a.mov"), PathBuf::from("/shows/a.mov"));
        assert_eq!(uri_to_path("/shows/a.mov"), PathBuf::from("/shows/a.mov"));
    }

    #[tokio::test]
    async fn test_build_movie_and_frames() {
        let builder = FsSourceBuilder::default();
        let sources = builder
            .build_sources(
                &record(Some("/missing/a.mov"), Some("/missing/a.####.exr")),
                FrameRate::default(),
            )
            .await
            .unwrap();

        // Missing media still produces sources.
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "SG Movie");
        assert!(sources[0].has_kind(MediaKind::Audio));
        assert_eq!(sources[1].name, "SG Frames");
        assert_eq!(sources[1].frame_range.as_deref(), Some("1001-1010"));
    }

    #[tokio::test]
    async fn test_build_without_paths_is_empty() {
        let builder = FsSourceBuilder::default();
        let sources = builder
            .build_sources(&record(None, None), FrameRate::default())
            .await
            .unwrap();
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_validate_source() {
        let dir = TempDir::new().unwrap();
        let movie = dir.path().join("a.mov");
        std::fs::write(&movie, b"mov").unwrap();

        let builder = FsSourceBuilder::default();
        let present = MediaSource::new(
            "a.mov",
            path_to_uri(&movie.to_string_lossy()),
            vec![MediaKind::Image],
        );
        assert!(builder.validate_source(&present, FrameRate::default()).await.unwrap());

        let sequence = MediaSource::new(
            "frames",
            path_to_uri(&dir.path().join("a.####.exr").to_string_lossy()),
            vec![MediaKind::Image],
        );
        assert!(builder.validate_source(&sequence, FrameRate::default()).await.unwrap());

        let missing = MediaSource::new("b.mov", "file:///nonexistent/b.mov", vec![MediaKind::Image]);
        assert!(!builder.validate_source(&missing, FrameRate::default()).await.unwrap());
    }
}
