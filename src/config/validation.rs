use crate::config::types::{Config, CrawlerConfig, OutputConfig, SourceConfig};
use crate::ConfigError;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the source site configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates pacing and retry settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seconds("wait-time", config.wait_time)?;
    validate_seconds("timeout", config.timeout)?;
    validate_seconds("retry-after", config.retry_after)?;

    if config.timeout == 0.0 {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.target_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// A duration in seconds must be finite, non-negative and usable as a deadline
fn validate_seconds(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            key, value
        )));
    }

    let fits = Duration::try_from_secs_f64(value)
        .ok()
        .and_then(|duration| Instant::now().checked_add(duration))
        .is_some();
    if !fits {
        return Err(ConfigError::Validation(format!(
            "{} is too large, got {} seconds",
            key, value
        )));
    }

    Ok(())
}
