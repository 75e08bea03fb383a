//! Error types for source collaborators.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, validating or looking up sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The collaborator could not be reached.
    #[error("Source service unavailable: {0}")]
    Unavailable(String),

    /// The record is missing data needed to build sources.
    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// Media could not be found on disk.
    #[error("Media not found: {path}")]
    NotFound { path: PathBuf },

    /// Reading descriptive detail for a source failed.
    #[error("Failed to acquire media detail: {reason}")]
    DetailFailed { reason: String },

    /// I/O error while inspecting media.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Creates a new invalid record error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Creates a new detail failed error.
    pub fn detail_failed(reason: impl Into<String>) -> Self {
        Self::DetailFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SourceError::invalid_record("no media paths");
        assert_eq!(err.to_string(), "Invalid record: no media paths");
        assert!(!err.is_retryable());

        let err = SourceError::Unavailable("ivy down".to_string());
        assert!(err.is_retryable());
    }
}
