//! Source collaborators.
//!
//! A [`SourceBuilder`] turns a version record into the primary sources of a
//! media item and validates candidate sources. A [`SupplementarySource`]
//! offers extra sources for items that already exist. Filesystem-backed
//! implementations of both are provided.

mod config;
mod error;
mod fs_builder;
mod fs_supplementary;
mod traits;
mod types;

pub use config::{SourceConfig, SupplementaryConfig};
pub use error::SourceError;
pub use fs_builder::{path_to_uri, uri_to_path, FsSourceBuilder};
pub use fs_supplementary::FsSupplementarySource;
pub use traits::{SourceBuilder, SupplementarySource};
pub use types::SupplementaryLookup;
