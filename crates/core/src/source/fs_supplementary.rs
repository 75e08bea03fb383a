//! Filesystem-backed supplementary source.
//!
//! Looks for extra media under `<root>/<project>/<external_id>/`. Every
//! visible file in that folder becomes one candidate source, named after the
//! file stem (`movie_dneg.mov` is the `movie_dneg` source).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::SourceError;
use super::fs_builder::path_to_uri;
use super::traits::SupplementarySource;
use super::types::SupplementaryLookup;
use crate::media::{FrameRate, MediaKind, MediaSource};

const MOVIE_EXTENSIONS: &[&str] = &["mov", "mp4", "mxf", "avi", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "aif", "aiff", "mp3", "flac"];

/// Supplementary source reading candidate media from a directory tree.
#[derive(Debug, Clone)]
pub struct FsSupplementarySource {
    root: PathBuf,
}

impl FsSupplementarySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn lookup_dir(&self, lookup: &SupplementaryLookup) -> PathBuf {
        let mut dir = self.root.clone();
        if let Some(project) = &lookup.project {
            dir.push(project);
        }
        dir.push(&lookup.external_id);
        dir
    }
}

/// Kinds a file provides, judged by its extension.
fn kinds_for(path: &Path) -> Vec<MediaKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if MOVIE_EXTENSIONS.contains(&ext.as_str()) {
        vec![MediaKind::Image, MediaKind::Audio]
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        vec![MediaKind::Audio]
    } else {
        vec![MediaKind::Image]
    }
}

#[async_trait]
impl SupplementarySource for FsSupplementarySource {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch_sources(
        &self,
        lookup: &SupplementaryLookup,
        _rate: FrameRate,
    ) -> Result<Vec<MediaSource>, SourceError> {
        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            return Err(SourceError::Unavailable(format!(
                "supplementary root {} does not exist",
                self.root.display()
            )));
        }

        let dir = self.lookup_dir(lookup);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "No supplementary media");
                return Ok(Vec::new());
            }
            Err(e) => return Err(SourceError::Io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.file_type().await?.is_file() {
                continue;
            }
            files.push((name, entry.path()));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let sources: Vec<MediaSource> = files
            .into_iter()
            .map(|(file_name, path)| {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or(file_name);
                let kinds = kinds_for(&path);
                MediaSource::new(name, path_to_uri(&path.to_string_lossy()), kinds)
            })
            .collect();

        debug!(
            external_id = %lookup.external_id,
            count = sources.len(),
            "Fetched supplementary sources"
        );
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lookup(project: Option<&str>, id: &str) -> SupplementaryLookup {
        SupplementaryLookup {
            project: project.map(str::to_string),
            external_id: id.to_string(),
        }
    }

    #[test]
    fn test_kinds_for_extension() {
        assert_eq!(kinds_for(Path::new("a.MOV")), vec![MediaKind::Image, MediaKind::Audio]);
        assert_eq!(kinds_for(Path::new("a.wav")), vec![MediaKind::Audio]);
        assert_eq!(kinds_for(Path::new("a.exr")), vec![MediaKind::Image]);
        assert_eq!(kinds_for(Path::new("noext")), vec![MediaKind::Image]);
    }

    #[tokio::test]
    async fn test_fetch_sorted_and_skips_hidden() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("ABC").join("uuid-1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("movie_dneg.mov"), b"").unwrap();
        std::fs::write(dir.join("audio.wav"), b"").unwrap();
        std::fs::write(dir.join(".DS_Store"), b"").unwrap();
        std::fs::create_dir(dir.join("subdir")).unwrap();

        let source = FsSupplementarySource::new(root.path());
        let sources = source
            .fetch_sources(&lookup(Some("ABC"), "uuid-1"), FrameRate::default())
            .await
            .unwrap();

        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["audio", "movie_dneg"]);
        assert!(sources[1].uri.starts_with("file://"));
    }

    #[tokio::test]
    async fn test_fetch_missing_dir_is_empty() {
        let root = TempDir::new().unwrap();
        let source = FsSupplementarySource::new(root.path());
        let sources = source
            .fetch_sources(&lookup(None, "unknown"), FrameRate::default())
            .await
            .unwrap();
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_root_is_unavailable() {
        let source = FsSupplementarySource::new("/nonexistent/supplementary/root");
        let err = source
            .fetch_sources(&lookup(None, "x"), FrameRate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.is_retryable());
    }
}
