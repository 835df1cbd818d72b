//! mangareader-dl: a polite, resumable comic downloader
//!
//! This crate walks a series on the source site, discovers its chapters and
//! their page counts, and downloads every page image into a chapter-per-folder
//! layout. Requests are paced and retried, and the discovered chapter index is
//! persisted so later runs only fetch what is missing.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for mangareader-dl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Cannot prepare target directory {path}: {source}")]
    TargetDir {
        path: String,
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Series URL errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL {url} is not on the source site {expected}")]
    ForeignDomain { url: String, expected: String },

    #[error("URL {0} points to the site root, not to a series")]
    SiteRoot(String),

    #[error("URL {0} is not a series URL")]
    NotASeries(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, MangaReaderMarkup, MarkupExtractor};
pub use storage::{ChapterIndex, ChapterRecord};
pub use url::{validate_series_url, Series};
