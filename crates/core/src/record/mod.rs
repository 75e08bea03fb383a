//! Metadata records consumed by the pipeline.

mod extract;
mod version;

pub use extract::{extract_version_records, PayloadContext};
pub use version::VersionRecord;

use thiserror::Error;

/// Errors reading metadata payloads.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The payload does not have a recognised shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A record is not a JSON object.
    #[error("Record is not a JSON object")]
    NotAnObject,
}
