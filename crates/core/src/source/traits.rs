//! Trait definitions for source collaborators.

use async_trait::async_trait;

use super::error::SourceError;
use super::types::SupplementaryLookup;
use crate::media::{FrameRate, MediaSource};
use crate::record::VersionRecord;

/// Builds and manages the playable sources of a media item.
#[async_trait]
pub trait SourceBuilder: Send + Sync {
    /// Returns the name of this builder implementation.
    fn name(&self) -> &str;

    /// Builds the primary sources for a record.
    ///
    /// An empty list means the record has no usable media; it is not an
    /// error.
    async fn build_sources(
        &self,
        record: &VersionRecord,
        rate: FrameRate,
    ) -> Result<Vec<MediaSource>, SourceError>;

    /// Checks that a source is readable by acquiring its detail.
    ///
    /// `Ok(false)` means the source should be discarded.
    async fn validate_source(&self, source: &MediaSource, rate: FrameRate)
        -> Result<bool, SourceError>;

    /// Shuts down a source that will not be used.
    async fn release_source(&self, source: MediaSource);
}

/// A second, independent source of media for already-built items.
#[async_trait]
pub trait SupplementarySource: Send + Sync {
    /// Returns the name of this data source.
    fn name(&self) -> &str;

    /// Fetches candidate sources for the item identified by `lookup`.
    ///
    /// Candidates are unvalidated.
    async fn fetch_sources(
        &self,
        lookup: &SupplementaryLookup,
        rate: FrameRate,
    ) -> Result<Vec<MediaSource>, SourceError>;
}
