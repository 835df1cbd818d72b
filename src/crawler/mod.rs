//! Crawler module for series discovery and page downloads
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with pacing and retry logic
//! - Markup extraction (chapter links, page counts, image URLs)
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{Crawler, DiscoveryError, DiscoveryReport, RunOptions};
pub use fetcher::{build_http_client, FetchError, FetchResult, Fetcher, USER_AGENT};
pub use parser::{MangaReaderMarkup, MarkupExtractor};

use crate::config::Config;
use crate::output::CrawlStats;
use crate::CrawlError;

/// Runs a complete crawl of one series
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and the series URL
/// 2. Open the progress database in the target directory
/// 3. Load or discover the chapter index
/// 4. Download every missing page
/// 5. Record the run and log statistics
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl finished (individual page failures are counted, not fatal)
/// * `Err(CrawlError)` - Setup or storage failed
pub async fn crawl(
    series_url: &str,
    config: &Config,
    config_hash: &str,
    options: &RunOptions,
) -> Result<CrawlStats, CrawlError> {
    let mut crawler = Crawler::new(series_url, config)?.with_config_hash(config_hash);
    crawler.run_with(options).await
}
