//! Configuration module for mangareader-dl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; a missing file section falls back to the defaults the
//! crawler has always shipped with (5s pacing, 10s timeout, 3 retries, 10s back-off).
//!
//! # Example
//!
//! ```no_run
//! use mangareader_dl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Waiting {}s between requests", config.crawler.wait_time);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SourceConfig, DEFAULT_BASE_URL};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub(crate) use parser::hash_str;
pub use validation::validate;
