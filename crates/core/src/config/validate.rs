use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Worker pool and command buffer are not empty
/// - Default frame rate is positive
/// - Supplementary root is set when augmentation is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.worker_count == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.worker_count cannot be 0".to_string(),
        ));
    }

    if config.pipeline.command_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.command_buffer cannot be 0".to_string(),
        ));
    }

    let rate = config.pipeline.default_rate;
    if rate.is_nan() || rate <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.default_rate must be positive, got {}",
            config.pipeline.default_rate
        )));
    }

    if config.supplementary.enabled && config.supplementary.root.is_none() {
        return Err(ConfigError::ValidationError(
            "supplementary.root is required when supplementary.enabled = true".to_string(),
        ));
    }

    Ok(())
}
