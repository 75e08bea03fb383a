//! Error types for the pipeline module.

use thiserror::Error;

use crate::record::RecordError;

/// Errors returned to callers of the pipeline.
///
/// Per-item failures never surface here; a failed item is simply missing
/// from the batch result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The builder is not running.
    #[error("Pipeline is not running")]
    NotRunning,

    /// The batch was dropped before it resolved.
    #[error("Batch was dropped before completion")]
    BatchDropped,

    /// The submitted payload could not be read.
    #[error("Invalid payload: {0}")]
    Records(#[from] RecordError),
}
