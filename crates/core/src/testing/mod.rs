//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait,
//! so the pipeline can be exercised end to end without a metadata service,
//! media on disk or a real playlist.
//!
//! # Example
//!
//! ```rust,ignore
//! use playbuild_core::testing::{fixtures, MockSourceBuilder, MockSupplementarySource};
//!
//! let sources = Arc::new(MockSourceBuilder::new());
//! let supplementary = Arc::new(MockSupplementarySource::new());
//!
//! // Configure mock behavior
//! sources.set_latency("shot_010", Duration::from_millis(20)).await;
//! supplementary.set_fail_all(true).await;
//!
//! let records = vec![fixtures::version_record(1, "shot_010")];
//! ```

mod activity;
mod mock_container;
mod mock_query;
mod mock_source_builder;
mod mock_supplementary;

pub use activity::{ActivityGuard, ActivityTracker};
pub use mock_container::{MockContainer, RecordedInsert};
pub use mock_query::MockEntityQuery;
pub use mock_source_builder::MockSourceBuilder;
pub use mock_supplementary::MockSupplementarySource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;

    use crate::media::{MediaKind, MediaSource};
    use crate::record::VersionRecord;

    /// Create a version record with reasonable defaults.
    ///
    /// The record has a movie path, a frame range, project "TEST" and
    /// external id `ext-<id>`.
    pub fn version_record(id: i64, code: &str) -> VersionRecord {
        let value = json!({
            "id": id,
            "type": "Version",
            "attributes": {
                "code": code,
                "sg_project_name": "TEST",
                "sg_ivy_dnuuid": format!("ext-{}", id),
                "sg_path_to_movie": format!("/shows/test/{}.mov", code),
                "sg_path_to_frames": null,
                "frame_range": "1001-1010"
            }
        });
        VersionRecord::from_object(value.as_object().cloned().unwrap_or_default())
    }

    /// Create a version record without an external id.
    pub fn unlinked_version_record(id: i64, code: &str) -> VersionRecord {
        let mut value = version_record(id, code).into_json();
        if let Some(attributes) = value.get_mut("attributes").and_then(|a| a.as_object_mut()) {
            attributes.remove("sg_ivy_dnuuid");
        }
        VersionRecord::from_object(value.as_object().cloned().unwrap_or_default())
    }

    /// Create a movie source providing image and audio.
    pub fn movie_source(name: &str) -> MediaSource {
        MediaSource::new(
            name,
            format!("file:///shows/test/{}.mov", name),
            vec![MediaKind::Image, MediaKind::Audio],
        )
    }
}
