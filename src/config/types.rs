use serde::Deserialize;
use std::time::Duration;

/// Source site the crawler was written against
pub const DEFAULT_BASE_URL: &str = "http://www.mangareader.net/";

/// Main configuration structure for mangareader-dl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Source site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Root address of the source site; series URLs must live on its host
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

/// Crawler pacing and retry configuration
///
/// Durations are expressed in (fractional) seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between the end of one request and the start of the next
    #[serde(rename = "wait-time", default = "default_wait_time")]
    pub wait_time: f64,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Additional attempts after a failed request
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay between two attempts of the same request
    #[serde(rename = "retry-after", default = "default_retry_after")]
    pub retry_after: f64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the chapter index and the chapter folders
    #[serde(rename = "target-dir", default = "default_target_dir")]
    pub target_dir: String,
}

impl CrawlerConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_secs_f64(self.wait_time)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    pub fn retry_after_duration(&self) -> Duration {
        Duration::from_secs_f64(self.retry_after)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            wait_time: default_wait_time(),
            timeout: default_timeout(),
            retries: default_retries(),
            retry_after: default_retry_after(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_wait_time() -> f64 {
    5.0
}

fn default_timeout() -> f64 {
    10.0
}

fn default_retries() -> u32 {
    3
}

fn default_retry_after() -> f64 {
    10.0
}

fn default_target_dir() -> String {
    ".".to_string()
}
