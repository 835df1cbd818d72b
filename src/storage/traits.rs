//! Storage traits and error types
//!
//! This module defines the trait interface for progress storage backends and
//! associated error types.

use crate::storage::{ChapterIndex, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt record for {series} chapter {chapter}: {message}")]
    CorruptRecord {
        series: String,
        chapter: i64,
        message: String,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence of the chapter index and of the run history
///
/// Everything is keyed by the series short name.
pub trait ProgressStore {
    // ===== Chapter Index =====

    /// Merges `index` into the index persisted under `series`
    ///
    /// New chapters are added. Chapters already stored keep their URL; a
    /// stored page count of 0 (unknown) is replaced by the new count.
    fn save(&mut self, series: &str, index: &ChapterIndex) -> StorageResult<()>;

    /// Loads the index persisted under `series`
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing was ever saved for this series
    /// * `Ok(Some(index))` - The merged index, in chapter order
    fn load(&self, series: &str) -> StorageResult<Option<ChapterIndex>>;

    /// Counts chapters stored for a series
    fn count_chapters(&self, series: &str) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `Running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, series: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Closes a run with its final status and traffic counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        request_count: u64,
        total_bytes: u64,
    ) -> StorageResult<()>;

    /// Lists the runs recorded for a series, oldest first
    fn list_runs(&self, series: &str) -> StorageResult<Vec<RunRecord>>;
}
