//! Error types for media containers.

use thiserror::Error;

use super::types::MediaId;

/// Errors a destination container can report.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The media item is already in the container.
    #[error("Media already in container: {0}")]
    DuplicateMedia(MediaId),

    /// The container refused the media item.
    #[error("Container rejected media: {reason}")]
    Rejected { reason: String },

    /// The container could not be reached.
    #[error("Container unavailable: {0}")]
    Unavailable(String),
}

impl ContainerError {
    /// Creates a new rejected error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
