//! Value types for the media model.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a media item.
///
/// Generated before any asynchronous work starts, so it doubles as the
/// ordering key for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(Uuid);

impl MediaId {
    /// Generates a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for MediaId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Uuid);

impl SourceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Playback rate in frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameRate(f64);

impl FrameRate {
    pub fn from_fps(fps: f64) -> Self {
        Self(fps)
    }

    pub fn fps(&self) -> f64 {
        self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(24.0)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}fps", self.0)
    }
}

/// Kind of media a source can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Every kind, in selection order.
    pub const ALL: [MediaKind; 2] = [MediaKind::Image, MediaKind::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        }
    }
}

/// Flag annotation applied to a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    /// Flag colour, e.g. "#FFFF0000".
    pub colour: String,
    /// Flag label.
    pub text: String,
}

impl Flag {
    pub fn new(colour: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            colour: colour.into(),
            text: text.into(),
        }
    }
}

/// One playable representation of a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Source identity.
    pub id: SourceId,
    /// Display name, e.g. "SG Movie" or "movie_dneg".
    pub name: String,
    /// Location of the media.
    pub uri: String,
    /// Frame range for image sequences, e.g. "1001-1100".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_range: Option<String>,
    /// Kinds of media this source provides.
    pub kinds: Vec<MediaKind>,
}

impl MediaSource {
    /// Creates a source with a fresh id.
    pub fn new(name: impl Into<String>, uri: impl Into<String>, kinds: Vec<MediaKind>) -> Self {
        Self {
            id: SourceId::generate(),
            name: name.into(),
            uri: uri.into(),
            frame_range: None,
            kinds,
        }
    }

    /// Sets the frame range.
    pub fn with_frame_range(mut self, frame_range: impl Into<String>) -> Self {
        self.frame_range = Some(frame_range.into());
        self
    }

    /// Whether this source provides the given kind.
    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.kinds.contains(&kind)
    }
}
