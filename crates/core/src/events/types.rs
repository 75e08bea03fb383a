use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::MediaId;
use crate::pipeline::Stage;

/// Why augmentation was skipped for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No supplementary source is configured.
    Disabled,
    /// The record carries no external identifier.
    NoLookup,
    /// The supplementary source could not be reached.
    Unavailable,
    /// The supplementary source failed for another reason.
    Error,
    /// The supplementary source had nothing for this item.
    Empty,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "disabled",
            SkipReason::NoLookup => "no_lookup",
            SkipReason::Unavailable => "unavailable",
            SkipReason::Error => "error",
            SkipReason::Empty => "empty",
        }
    }
}

/// Pipeline event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    BatchSubmitted {
        batch_id: Uuid,
        media_count: usize,
    },
    /// Primary construction succeeded; the item is usable.
    MediaBuilt {
        batch_id: Uuid,
        media_id: MediaId,
        name: String,
        source_count: usize,
    },
    MediaFailed {
        batch_id: Uuid,
        media_id: MediaId,
        stage: Stage,
        error: String,
    },
    /// A candidate source failed validation and was released.
    SourceDiscarded {
        batch_id: Uuid,
        media_id: MediaId,
        source_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    AugmentationSkipped {
        batch_id: Uuid,
        media_id: MediaId,
        reason: SkipReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    SourcesAugmented {
        batch_id: Uuid,
        media_id: MediaId,
        added: usize,
    },
    BatchCompleted {
        batch_id: Uuid,
        built: usize,
        failed: usize,
        duration_ms: u64,
    },
}

impl PipelineEvent {
    /// Batch the event belongs to.
    pub fn batch_id(&self) -> Uuid {
        match self {
            PipelineEvent::BatchSubmitted { batch_id, .. }
            | PipelineEvent::MediaBuilt { batch_id, .. }
            | PipelineEvent::MediaFailed { batch_id, .. }
            | PipelineEvent::SourceDiscarded { batch_id, .. }
            | PipelineEvent::AugmentationSkipped { batch_id, .. }
            | PipelineEvent::SourcesAugmented { batch_id, .. }
            | PipelineEvent::BatchCompleted { batch_id, .. } => *batch_id,
        }
    }
}
