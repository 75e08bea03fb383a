//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::media::{Flag, FrameRate, MediaContainer, MediaId};
use crate::record::PayloadContext;

/// The two stages a job goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Build the media item from the record.
    Primary,
    /// Augment the built item with supplementary sources.
    Secondary,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Primary => "primary",
            Stage::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller options applied to every item of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOptions {
    /// Explicit frame rate. Falls back to the container's, then the default.
    pub rate: Option<FrameRate>,
    /// Preferred image source names, in order.
    pub preferred_visual_sources: Vec<String>,
    /// Preferred audio source names, in order.
    pub preferred_audio_sources: Vec<String>,
    /// Flag applied to every built item.
    pub flag: Option<Flag>,
}

impl BuildOptions {
    /// Options carried by a payload's context.
    pub fn from_context(context: PayloadContext) -> Self {
        Self {
            rate: None,
            preferred_visual_sources: context.visual_sources,
            preferred_audio_sources: context.audio_sources,
            flag: context.flag,
        }
    }

    pub fn with_rate(mut self, rate: FrameRate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flag = Some(flag);
        self
    }
}

/// Where built items go.
#[derive(Clone, Default)]
pub struct BuildTarget {
    /// Container receiving each item once built.
    pub container: Option<Arc<dyn MediaContainer>>,
    /// Existing item the batch is inserted before.
    pub insert_before: Option<MediaId>,
}

impl BuildTarget {
    /// Build without inserting anywhere.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build into `container`, appending.
    pub fn into_container(container: Arc<dyn MediaContainer>) -> Self {
        Self {
            container: Some(container),
            insert_before: None,
        }
    }

    pub fn before(mut self, id: MediaId) -> Self {
        self.insert_before = Some(id);
        self
    }
}

impl fmt::Debug for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildTarget")
            .field("container", &self.container.as_ref().map(|c| c.name().to_string()))
            .field("insert_before", &self.insert_before)
            .finish()
    }
}

/// Dispatch counts of one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub index: usize,
    /// Stages dispatched to this worker since startup.
    pub dispatched: u64,
}

/// Overall builder status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderStatus {
    /// Whether the builder accepts submissions.
    pub running: bool,
    /// Maximum concurrently dispatched stages.
    pub capacity: usize,
    /// Stages dispatched and not yet completed.
    pub in_flight: usize,
    /// Jobs waiting for the primary stage.
    pub primary_queued: usize,
    /// Jobs waiting for the secondary stage.
    pub secondary_queued: usize,
    /// Total items built since startup.
    pub total_built: u64,
    /// Total items failed since startup.
    pub total_failed: u64,
    pub workers: Vec<WorkerStatus>,
}
