//! Crawl statistics
//!
//! `CrawlStats` accumulates what a single run did; `StoredStatistics` is
//! read back from the progress database for the `--stats` report.

use crate::state::PageOutcome;
use crate::storage::{ChapterIndex, ProgressStore, RunRecord};
use crate::CrawlError;

const MIB: f64 = 1024.0 * 1024.0;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Requests that received a response
    pub request_count: u64,

    /// Bytes received in successful responses
    pub total_bytes: u64,

    /// Chapters whose download loop ran
    pub chapters_visited: u64,

    pub images_saved: u64,
    pub images_skipped: u64,
    pub images_failed: u64,
}

impl CrawlStats {
    /// Counts one page outcome
    pub fn record(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Saved => self.images_saved += 1,
            PageOutcome::Skipped => self.images_skipped += 1,
            outcome if outcome.is_error() => self.images_failed += 1,
            _ => {}
        }
    }

    pub fn total_mib(&self) -> f64 {
        self.total_bytes as f64 / MIB
    }
}

/// Logs the end-of-run statistics
pub fn log_statistics(stats: &CrawlStats) {
    tracing::info!("[Statistics]: Total requests made: {}", stats.request_count);
    tracing::info!(
        "[Statistics]: Total bytes downloaded: {:.2} MiB",
        stats.total_mib()
    );
    tracing::info!(
        "[Statistics]: Chapters visited: {}, images saved: {}, skipped: {}, failed: {}",
        stats.chapters_visited,
        stats.images_saved,
        stats.images_skipped,
        stats.images_failed
    );
}

/// What the progress database knows about a series
#[derive(Debug, Clone)]
pub struct StoredStatistics {
    pub series: String,
    pub index: ChapterIndex,
    pub runs: Vec<RunRecord>,
}

impl StoredStatistics {
    /// Total pages over chapters with a known count
    pub fn total_pages(&self) -> u64 {
        self.index.values().map(|r| r.page_count as u64).sum()
    }

    /// Chapters recorded with the unknown page count sentinel
    pub fn unknown_chapters(&self) -> Vec<u32> {
        self.index
            .iter()
            .filter(|(_, r)| r.is_unknown())
            .map(|(n, _)| *n)
            .collect()
    }
}

/// Loads statistics for a series from storage
pub fn load_statistics(
    storage: &dyn ProgressStore,
    series: &str,
) -> Result<StoredStatistics, CrawlError> {
    let index = storage.load(series)?.unwrap_or_default();
    let runs = storage.list_runs(series)?;

    Ok(StoredStatistics {
        series: series.to_string(),
        index,
        runs,
    })
}

/// Prints stored statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoredStatistics) {
    println!("=== {} ===\n", stats.series);

    println!("Chapter index:");
    println!("  Chapters: {}", stats.index.len());
    println!("  Pages: {}", stats.total_pages());

    let unknown = stats.unknown_chapters();
    if !unknown.is_empty() {
        println!("  Chapters with unknown page count: {:?}", unknown);
    }
    println!();

    if stats.runs.is_empty() {
        println!("No runs recorded.");
        return;
    }

    println!("Runs ({}):", stats.runs.len());
    for run in &stats.runs {
        println!(
            "  #{} {} [{}] {} requests, {:.2} MiB{}",
            run.id,
            run.started_at,
            run.status.to_db_string(),
            run.request_count,
            run.total_bytes as f64 / MIB,
            run.finished_at
                .as_ref()
                .map(|f| format!(", finished {}", f))
                .unwrap_or_default()
        );
    }

    let requests: u64 = stats.runs.iter().map(|r| r.request_count).sum();
    let bytes: u64 = stats.runs.iter().map(|r| r.total_bytes).sum();
    println!();
    println!(
        "All runs: {} requests, {:.2} MiB downloaded",
        requests,
        bytes as f64 / MIB
    );
}
