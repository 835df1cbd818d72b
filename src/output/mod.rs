//! Output module for downloaded images and crawl statistics
//!
//! This module handles:
//! - The on-disk layout: `<target>/CH-<chapter:03>/<chapter>-<page:02>.jpeg`
//! - Writing page images
//! - Collecting and reporting crawl statistics
//!
//! Paths are always composed from the target directory; the process working
//! directory is never changed.

pub mod stats;

pub use stats::{load_statistics, log_statistics, print_statistics, CrawlStats, StoredStatistics};

use std::io;
use std::path::{Path, PathBuf};

/// Extension of saved page images
pub const IMAGE_EXTENSION: &str = "jpeg";

/// Folder name for a chapter, e.g. `CH-007`
pub fn chapter_dir_name(chapter: u32) -> String {
    format!("CH-{:03}", chapter)
}

/// File name for a page image, e.g. `7-03.jpeg`
pub fn page_file_name(chapter: u32, page: u32) -> String {
    format!("{}-{:02}.{}", chapter, page, IMAGE_EXTENSION)
}

pub fn chapter_dir(target_dir: &Path, chapter: u32) -> PathBuf {
    target_dir.join(chapter_dir_name(chapter))
}

pub fn page_path(target_dir: &Path, chapter: u32, page: u32) -> PathBuf {
    chapter_dir(target_dir, chapter).join(page_file_name(chapter, page))
}

/// Creates the chapter folder if it does not exist yet
///
/// # Returns
///
/// * `Ok(true)` - The folder was created
/// * `Ok(false)` - The folder already existed
pub async fn ensure_chapter_dir(target_dir: &Path, chapter: u32) -> io::Result<bool> {
    let dir = chapter_dir(target_dir, chapter);
    if tokio::fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(false);
    }
    tokio::fs::create_dir_all(&dir).await?;
    Ok(true)
}

/// Checks whether a page image is already on disk
pub async fn page_exists(target_dir: &Path, chapter: u32, page: u32) -> bool {
    tokio::fs::try_exists(page_path(target_dir, chapter, page))
        .await
        .unwrap_or(false)
}

/// Writes a page image in one go
pub async fn write_image(path: &Path, bytes: &[u8]) -> io::Result<()> {
    tokio::fs::write(path, bytes).await
}
