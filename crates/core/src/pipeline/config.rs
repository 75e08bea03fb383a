//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the build pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of workers, which is also the cap on in-flight stages.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Delay before the dispatcher pumps again after a stage completes.
    /// 0 yields to the scheduler and pumps straight away.
    #[serde(default = "default_dispatch_delay")]
    pub dispatch_delay_ms: u64,

    /// Capacity of the dispatcher's command channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Frame rate used when neither the caller nor the container gives one.
    #[serde(default = "default_rate")]
    pub default_rate: f64,

    /// Well-known source names tried after the caller's preferences.
    #[serde(default = "default_source_names")]
    pub default_source_names: Vec<String>,
}

fn default_worker_count() -> usize {
    8
}

fn default_dispatch_delay() -> u64 {
    10
}

fn default_command_buffer() -> usize {
    256
}

fn default_rate() -> f64 {
    24.0
}

fn default_source_names() -> Vec<String> {
    vec!["movie_dneg".to_string(), "SG Movie".to_string()]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            dispatch_delay_ms: default_dispatch_delay(),
            command_buffer: default_command_buffer(),
            default_rate: default_rate(),
            default_source_names: default_source_names(),
        }
    }
}

impl PipelineConfig {
    /// Sets the number of workers.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets the re-arm delay in milliseconds.
    pub fn with_dispatch_delay(mut self, delay_ms: u64) -> Self {
        self.dispatch_delay_ms = delay_ms;
        self
    }

    /// Sets the fallback frame rate.
    pub fn with_default_rate(mut self, fps: f64) -> Self {
        self.default_rate = fps;
        self
    }

    /// Sets the well-known default source names.
    pub fn with_default_source_names(mut self, names: Vec<String>) -> Self {
        self.default_source_names = names;
        self
    }

    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.dispatch_delay(), Duration::from_millis(10));
        assert_eq!(config.default_source_names, vec!["movie_dneg", "SG Movie"]);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_worker_count(2)
            .with_dispatch_delay(0)
            .with_default_rate(25.0);

        assert_eq!(config.worker_count, 2);
        assert_eq!(config.dispatch_delay_ms, 0);
        assert_eq!(config.default_rate, 25.0);
    }
}
