//! Configuration for the source collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for building primary sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name given to sources built from a record's movie path.
    #[serde(default = "default_movie_name")]
    pub movie_source_name: String,

    /// Name given to sources built from a record's frames path.
    #[serde(default = "default_frames_name")]
    pub frames_source_name: String,
}

/// Configuration for the supplementary (augmentation) source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplementaryConfig {
    /// Whether augmentation runs at all.
    #[serde(default)]
    pub enabled: bool,

    /// Root directory holding `<project>/<external_id>/` source folders.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

fn default_movie_name() -> String {
    "SG Movie".to_string()
}

fn default_frames_name() -> String {
    "SG Frames".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            movie_source_name: default_movie_name(),
            frames_source_name: default_frames_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SourceConfig::default();
        assert_eq!(config.movie_source_name, "SG Movie");
        assert_eq!(config.frames_source_name, "SG Frames");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SourceConfig = toml::from_str(r#"frames_source_name = "Frames""#).unwrap();
        assert_eq!(config.movie_source_name, "SG Movie");
        assert_eq!(config.frames_source_name, "Frames");
    }
}
