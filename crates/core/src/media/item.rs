//! The constructed playlist media entry.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::selection::select_default_source;
use super::types::{Flag, FrameRate, MediaId, MediaKind, MediaSource, SourceId};

/// A media item: a named container of one or more sources.
///
/// Shared as `Arc<MediaItem>` between the pipeline, the destination
/// container and the caller.
#[derive(Debug)]
pub struct MediaItem {
    id: MediaId,
    name: String,
    rate: FrameRate,
    state: RwLock<ItemState>,
}

#[derive(Debug, Default)]
struct ItemState {
    sources: Vec<MediaSource>,
    current: HashMap<MediaKind, SourceId>,
    flag: Option<Flag>,
    metadata: serde_json::Map<String, Value>,
}

/// Serializable view of a media item.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItemSnapshot {
    pub id: MediaId,
    pub name: String,
    pub rate: FrameRate,
    pub sources: Vec<MediaSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<Flag>,
}

impl MediaItem {
    /// Creates an empty media item.
    pub fn new(id: MediaId, name: impl Into<String>, rate: FrameRate) -> Self {
        Self {
            id,
            name: name.into(),
            rate,
            state: RwLock::new(ItemState::default()),
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Attaches sources in one call. Returns the total source count.
    pub async fn add_sources(&self, sources: Vec<MediaSource>) -> usize {
        let mut state = self.state.write().await;
        state.sources.extend(sources);
        state.sources.len()
    }

    /// Returns all attached sources.
    pub async fn sources(&self) -> Vec<MediaSource> {
        self.state.read().await.sources.clone()
    }

    /// Returns the number of attached sources.
    pub async fn source_count(&self) -> usize {
        self.state.read().await.sources.len()
    }

    /// Names of the sources providing `kind`.
    pub async fn source_names(&self, kind: MediaKind) -> Vec<String> {
        self.state
            .read()
            .await
            .sources
            .iter()
            .filter(|s| s.has_kind(kind))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Marks the named source as the default for `kind`.
    ///
    /// Returns false if no attached source with that name provides `kind`.
    pub async fn set_default_source(&self, name: &str, kind: MediaKind) -> bool {
        let mut state = self.state.write().await;
        let found = state
            .sources
            .iter()
            .find(|s| s.name == name && s.has_kind(kind))
            .map(|s| s.id);

        match found {
            Some(id) => {
                state.current.insert(kind, id);
                true
            }
            None => false,
        }
    }

    /// Returns the default source for `kind`, if one was selected.
    pub async fn default_source(&self, kind: MediaKind) -> Option<MediaSource> {
        let state = self.state.read().await;
        let id = state.current.get(&kind)?;
        state.sources.iter().find(|s| &s.id == id).cloned()
    }

    /// Runs default-source selection for every media kind.
    pub async fn apply_default_sources(
        &self,
        preferred_visual: &[String],
        preferred_audio: &[String],
        defaults: &[String],
    ) {
        let sources = self.sources().await;
        for kind in MediaKind::ALL {
            let preferred = match kind {
                MediaKind::Image => preferred_visual,
                MediaKind::Audio => preferred_audio,
            };
            if let Some(name) = select_default_source(&sources, kind, preferred, defaults) {
                self.set_default_source(name, kind).await;
            }
        }
    }

    pub async fn set_flag(&self, flag: Flag) {
        self.state.write().await.flag = Some(flag);
    }

    pub async fn flag(&self) -> Option<Flag> {
        self.state.read().await.flag.clone()
    }

    /// Stores a metadata document under `key`.
    pub async fn set_metadata(&self, key: impl Into<String>, value: Value) {
        self.state.write().await.metadata.insert(key.into(), value);
    }

    pub async fn metadata(&self, key: &str) -> Option<Value> {
        self.state.read().await.metadata.get(key).cloned()
    }

    /// Takes a serializable snapshot of the item.
    pub async fn snapshot(&self) -> MediaItemSnapshot {
        let state = self.state.read().await;
        let current_name = |kind: MediaKind| {
            state.current.get(&kind).and_then(|id| {
                state
                    .sources
                    .iter()
                    .find(|s| &s.id == id)
                    .map(|s| s.name.clone())
            })
        };

        MediaItemSnapshot {
            id: self.id,
            name: self.name.clone(),
            rate: self.rate,
            sources: state.sources.clone(),
            image_source: current_name(MediaKind::Image),
            audio_source: current_name(MediaKind::Audio),
            flag: state.flag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie(name: &str) -> MediaSource {
        MediaSource::new(name, format!("file:///{}.mov", name), vec![MediaKind::Image, MediaKind::Audio])
    }

    #[tokio::test]
    async fn test_add_sources_and_names() {
        let item = MediaItem::new(MediaId::generate(), "shot_010_comp_v003", FrameRate::default());
        assert_eq!(item.add_sources(vec![movie("SG Movie")]).await, 1);
        assert_eq!(
            item.add_sources(vec![MediaSource::new("SG Frames", "file:///f.exr", vec![MediaKind::Image])])
                .await,
            2
        );

        assert_eq!(item.source_names(MediaKind::Image).await.len(), 2);
        assert_eq!(item.source_names(MediaKind::Audio).await, vec!["SG Movie".to_string()]);
    }

    #[tokio::test]
    async fn test_set_default_source_unknown_name() {
        let item = MediaItem::new(MediaId::generate(), "a", FrameRate::default());
        item.add_sources(vec![movie("SG Movie")]).await;

        assert!(!item.set_default_source("movie_dneg", MediaKind::Image).await);
        assert!(item.default_source(MediaKind::Image).await.is_none());
        assert!(item.set_default_source("SG Movie", MediaKind::Image).await);
        assert_eq!(
            item.default_source(MediaKind::Image).await.unwrap().name,
            "SG Movie"
        );
    }

    #[tokio::test]
    async fn test_apply_default_sources_reselects_after_extension() {
        let item = MediaItem::new(MediaId::generate(), "a", FrameRate::default());
        let defaults = vec!["movie_dneg".to_string(), "SG Movie".to_string()];

        item.add_sources(vec![movie("SG Movie")]).await;
        item.apply_default_sources(&[], &[], &defaults).await;
        assert_eq!(item.snapshot().await.image_source.as_deref(), Some("SG Movie"));

        item.add_sources(vec![movie("movie_dneg")]).await;
        item.apply_default_sources(&[], &[], &defaults).await;
        let snapshot = item.snapshot().await;
        assert_eq!(snapshot.image_source.as_deref(), Some("movie_dneg"));
        assert_eq!(snapshot.audio_source.as_deref(), Some("movie_dneg"));
    }

    #[tokio::test]
    async fn test_flag_and_metadata() {
        let item = MediaItem::new(MediaId::generate(), "a", FrameRate::default());
        item.set_flag(Flag::new("#FFFF0000", "Review")).await;
        item.set_metadata("version", json!({"id": 42})).await;

        assert_eq!(item.flag().await.unwrap().text, "Review");
        assert_eq!(item.metadata("version").await.unwrap()["id"], 42);
        assert!(item.metadata("shot").await.is_none());

        let json = serde_json::to_value(item.snapshot().await).unwrap();
        assert_eq!(json["flag"]["colour"], "#FFFF0000");
    }
}
