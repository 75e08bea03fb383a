use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineConfig;
use crate::source::{SourceConfig, SupplementaryConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub supplementary: SupplementaryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.worker_count, 8);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(!config.supplementary.enabled);
    }

    #[test]
    fn test_deserialize_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.dispatch_delay_ms, 10);
        assert_eq!(config.sources.movie_source_name, "SG Movie");
    }

    #[test]
    fn test_serialize_roundtrip_keeps_sections() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[pipeline]"));
        assert!(text.contains("[logging]"));
    }
}
