//! Storage module for persisting crawl progress
//!
//! This module handles all database operations for the crawler:
//! - the discovered chapter index, merged on every save
//! - run tracking (start/finish, traffic counters)
//!
//! The database lives next to the downloads as `<target_dir>/<series>.db`.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ProgressStore, StorageError, StorageResult};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Extension of the progress database file
pub const INDEX_EXTENSION: &str = "db";

/// One discovered chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    /// Absolute URL of the chapter's first page view
    pub chapter_url: String,

    /// Number of pages; 0 means the count could not be determined
    pub page_count: u32,
}

impl ChapterRecord {
    pub fn new(chapter_url: impl Into<String>, page_count: u32) -> Self {
        Self {
            chapter_url: chapter_url.into(),
            page_count,
        }
    }

    /// Returns true when the page count is the unknown sentinel
    pub fn is_unknown(&self) -> bool {
        self.page_count == 0
    }
}

/// Chapter number (1-based) to chapter record, iterated in chapter order
///
/// Chapters are numbered in discovery order, so chapter order and
/// discovery order coincide.
pub type ChapterIndex = BTreeMap<u32, ChapterRecord>;

/// Path of the progress database for a series
pub fn index_path(target_dir: &Path, series: &str) -> PathBuf {
    target_dir.join(format!("{}.{}", series, INDEX_EXTENSION))
}

/// Opens (creating if needed) the progress database for a series
pub fn open_storage(target_dir: &Path, series: &str) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(&index_path(target_dir, series))
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub series: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub request_count: u64,
    pub total_bytes: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
