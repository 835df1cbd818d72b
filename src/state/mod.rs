//! State tracking for the crawl
//!
//! `CrawlState` carries request pacing and traffic counters for a fetcher,
//! `PageOutcome` records how each page download ended.

mod crawl_state;
mod page_state;

pub use crawl_state::CrawlState;
pub use page_state::PageOutcome;
