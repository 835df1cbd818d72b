//! Crawler coordinator - main crawl orchestration logic
//!
//! This module walks series → chapters → pages:
//! - discovering the chapter index (chapter URL and page count per chapter)
//! - persisting and reloading that index through the progress store
//! - downloading every missing page image into its chapter folder
//! - recording the run and reporting statistics

use crate::config::{hash_str, validate, Config};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{MangaReaderMarkup, MarkupExtractor};
use crate::output::{self, CrawlStats};
use crate::state::PageOutcome;
use crate::storage::{
    index_path, open_storage, ChapterIndex, ChapterRecord, ProgressStore, RunStatus,
    SqliteStorage,
};
use crate::url::Series;
use crate::{CrawlError, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Problems found while building the chapter index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("Failed to get series page {url}")]
    SeriesUnavailable { url: String },

    #[error("Failed to locate chapters' links on {url}")]
    NoChapters { url: String },

    #[error("Failed to get chapter {chapter} page {url}")]
    ChapterUnavailable { chapter: u32, url: String },

    #[error("Can't resolve chapter {chapter} link {href}")]
    BadChapterLink { chapter: u32, href: String },

    #[error("Failed to locate chapter {chapter} pages count on {url}")]
    MissingPageCount { chapter: u32, url: String },
}

/// What a discovery run achieved
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Number of passes made (a pass restarts after a fetch failure)
    pub passes: u32,

    /// True when the last pass visited every chapter link
    pub completed: bool,

    /// Errors of the last pass
    pub errors: Vec<DiscoveryError>,
}

/// Options for a crawl run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Rediscover even if a chapter index was persisted
    pub fresh: bool,

    /// Chapters to download; empty means every chapter in the index
    pub chapters: Vec<u32>,
}

/// Main crawler structure
///
/// Owns the fetcher (and with it the pacing state), the markup extractor,
/// the progress store and the in-memory chapter index for one series.
pub struct Crawler<M: MarkupExtractor = MangaReaderMarkup> {
    series: Series,
    base_url: Url,
    target_dir: PathBuf,
    fetcher: Fetcher,
    markup: M,
    storage: SqliteStorage,
    index: ChapterIndex,
    retries: u32,
    config_hash: String,
    stats: CrawlStats,
}

impl Crawler<MangaReaderMarkup> {
    /// Creates a crawler for the mangareader.net markup
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, the URL is not a series URL
    /// on the configured source site, or the target directory / progress
    /// database cannot be created. No crawler exists afterwards.
    pub fn new(series_url: &str, config: &Config) -> Result<Self> {
        Self::with_markup(series_url, config, MangaReaderMarkup)
    }
}

impl<M: MarkupExtractor> Crawler<M> {
    /// Creates a crawler with a custom markup extractor
    pub fn with_markup(series_url: &str, config: &Config, markup: M) -> Result<Self> {
        validate(config)?;
        tracing::info!("Starting crawler for {}", series_url.trim());

        let base_url = Url::parse(&config.source.base_url)?;
        let series = Series::parse(series_url, &base_url).map_err(|e| {
            tracing::error!("{}", e);
            CrawlError::from(e)
        })?;

        let target_dir = PathBuf::from(&config.output.target_dir);
        std::fs::create_dir_all(&target_dir).map_err(|source| {
            tracing::error!(
                "Can't create folder {}: {}",
                target_dir.display(),
                source
            );
            CrawlError::TargetDir {
                path: target_dir.display().to_string(),
                source,
            }
        })?;
        tracing::info!("Using directory: {}", target_dir.display());

        let storage = open_storage(&target_dir, &series.name)?;
        let fetcher = Fetcher::new(&config.crawler)?;

        Ok(Self {
            series,
            base_url,
            target_dir,
            retries: fetcher.retries(),
            fetcher,
            markup,
            storage,
            index: ChapterIndex::new(),
            config_hash: hash_str(&format!("{:?}", config)),
            stats: CrawlStats::default(),
        })
    }

    /// Records `hash` as the configuration hash of the runs this crawler makes
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Path of the persisted chapter index
    pub fn index_path(&self) -> PathBuf {
        index_path(&self.target_dir, &self.series.name)
    }

    /// The chapter index currently in memory
    pub fn chapter_index(&self) -> &ChapterIndex {
        &self.index
    }

    /// Statistics so far, including the fetcher's traffic counters
    pub fn stats(&self) -> CrawlStats {
        let state = self.fetcher.state();
        CrawlStats {
            request_count: state.request_count,
            total_bytes: state.total_bytes,
            ..self.stats.clone()
        }
    }

    // ===== Chapter Index =====

    /// Replaces the in-memory index with the persisted one, if any
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A persisted index was loaded
    /// * `Ok(false)` - Nothing persisted for this series
    pub fn load_chapter_index(&mut self) -> Result<bool> {
        match self.storage.load(&self.series.name)? {
            Some(index) => {
                self.index = index;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Merges the in-memory index into the persisted one and reloads the result
    pub fn save_chapter_index(&mut self) -> Result<()> {
        self.storage.save(&self.series.name, &self.index)?;
        tracing::debug!(
            "{} chapters stored for {}",
            self.storage.count_chapters(&self.series.name)?,
            self.series.name
        );
        if let Some(merged) = self.storage.load(&self.series.name)? {
            self.index = merged;
        }
        Ok(())
    }

    /// Builds the chapter index from the series page
    ///
    /// A fetch failure of the series page or of any chapter page restarts
    /// the whole pass, up to `retries` times. After the last pass the
    /// in-memory index holds whatever that pass recorded. A chapter without
    /// a page count marker is recorded with count 0 and reported, and
    /// discovery moves on to the next chapter.
    pub async fn discover_chapters(&mut self) -> DiscoveryReport {
        let passes = self.retries + 1;
        let mut report = DiscoveryReport::default();

        for pass in 1..=passes {
            report.passes = pass;
            report.errors.clear();

            let mut index = ChapterIndex::new();
            let outcome = self.discovery_pass(&mut index, &mut report.errors).await;
            self.index = index;

            match outcome {
                Ok(()) => {
                    report.completed = true;
                    tracing::info!("Found {} chapter links", self.index.len());
                    return report;
                }
                Err(e @ DiscoveryError::NoChapters { .. }) => {
                    tracing::error!("{}", e);
                    report.errors.push(e);
                    return report;
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    report.errors.push(e);
                    if pass < passes {
                        tracing::warn!("Failed to get chapter list info, retrying..");
                    }
                }
            }
        }

        tracing::error!("Exceeded maximum retry count! Failed to get chapter list!");
        report
    }

    async fn discovery_pass(
        &mut self,
        index: &mut ChapterIndex,
        errors: &mut Vec<DiscoveryError>,
    ) -> std::result::Result<(), DiscoveryError> {
        tracing::info!("Getting list of available chapters...");

        let series_url = self.series.url.clone();
        let body = self
            .fetcher
            .fetch(&series_url)
            .await
            .map_err(|_| DiscoveryError::SeriesUnavailable {
                url: series_url.clone(),
            })?;

        let links = self
            .markup
            .extract_chapter_links(&String::from_utf8_lossy(&body));
        if links.is_empty() {
            return Err(DiscoveryError::NoChapters { url: series_url });
        }

        for (chapter, href) in (1u32..).zip(links) {
            let chapter_url = match self.base_url.join(&href) {
                Ok(url) => url.as_str().trim_end_matches('/').to_string(),
                Err(e) => {
                    let error = DiscoveryError::BadChapterLink { chapter, href };
                    tracing::warn!("{}: {}", error, e);
                    errors.push(error);
                    continue;
                }
            };

            let body = self.fetcher.fetch(&chapter_url).await.map_err(|_| {
                DiscoveryError::ChapterUnavailable {
                    chapter,
                    url: chapter_url.clone(),
                }
            })?;

            match self
                .markup
                .extract_page_count(&String::from_utf8_lossy(&body))
            {
                Some(page_count) => {
                    tracing::debug!("Chapter {}, {} pages..", chapter, page_count);
                    index.insert(chapter, ChapterRecord::new(chapter_url, page_count));
                }
                None => {
                    let error = DiscoveryError::MissingPageCount {
                        chapter,
                        url: chapter_url.clone(),
                    };
                    tracing::error!("{}", error);
                    index.insert(chapter, ChapterRecord::new(chapter_url, 0));
                    errors.push(error);
                }
            }
        }

        Ok(())
    }

    // ===== Downloads =====

    /// Downloads every missing page of a chapter
    ///
    /// Pages whose file already exists are skipped without any request.
    ///
    /// # Returns
    ///
    /// * `Some(outcomes)` - One outcome per page, in page order
    /// * `None` - Chapter not in the index, or its folder could not be created
    pub async fn download_chapter(&mut self, chapter: u32) -> Option<Vec<PageOutcome>> {
        let Some(record) = self.index.get(&chapter).cloned() else {
            tracing::error!("Chapter {} isn't available in the chapter list!", chapter);
            tracing::debug!(
                "Available chapters: {:?}",
                self.index.keys().collect::<Vec<_>>()
            );
            return None;
        };

        tracing::info!("Getting chapter {} pages..", chapter);
        if !self.prepare_chapter_dir(chapter).await {
            return None;
        }

        if record.is_unknown() {
            tracing::warn!(
                "Chapter {} has no known page count, nothing to download",
                chapter
            );
        }

        self.stats.chapters_visited += 1;
        let mut outcomes = Vec::with_capacity(record.page_count as usize);

        for page in 1..=record.page_count {
            let outcome = if output::page_exists(&self.target_dir, chapter, page).await {
                tracing::debug!(
                    "Chapter page {} exists already. Skipping to next page..",
                    output::page_file_name(chapter, page)
                );
                PageOutcome::Skipped
            } else {
                self.save_page(chapter, page).await
            };

            self.stats.record(outcome);
            outcomes.push(outcome);
        }

        tracing::info!("Finished downloading chapter {}", chapter);
        Some(outcomes)
    }

    /// Downloads one page image, overwriting any existing file
    pub async fn download_page(&mut self, chapter: u32, page: u32) -> PageOutcome {
        let outcome = if self.index.contains_key(&chapter)
            && !self.prepare_chapter_dir(chapter).await
        {
            PageOutcome::WriteFailed
        } else {
            self.save_page(chapter, page).await
        };

        self.stats.record(outcome);
        outcome
    }

    async fn prepare_chapter_dir(&self, chapter: u32) -> bool {
        match output::ensure_chapter_dir(&self.target_dir, chapter).await {
            Ok(true) => {
                tracing::info!("Creating directory: {}", output::chapter_dir_name(chapter));
                true
            }
            Ok(false) => {
                tracing::debug!("Chapter {} directory exists already!", chapter);
                true
            }
            Err(e) => {
                tracing::error!("Can't create directory for chapter {}: {}", chapter, e);
                false
            }
        }
    }

    /// Fetches the page view, then the image, then writes it
    ///
    /// Transient fetch failures are already retried by the fetcher. A page
    /// view without an image element is fetched again up to `retries` times.
    async fn save_page(&mut self, chapter: u32, page: u32) -> PageOutcome {
        let Some(record) = self.index.get(&chapter).cloned() else {
            tracing::error!("Chapter {} isn't available!", chapter);
            return PageOutcome::Unavailable;
        };

        if page == 0 || page > record.page_count {
            tracing::error!("Chapter page {}-{} isn't available!", chapter, page);
            return PageOutcome::Unavailable;
        }

        let page_url = format!("{}/{}", record.chapter_url, page);
        let mut attempts = 0;

        let src = loop {
            attempts += 1;

            let body = match self.fetcher.fetch(&page_url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!("Failed to get chapter page {}-{}: {}", chapter, page, e);
                    return PageOutcome::FetchFailed;
                }
            };

            if let Some(src) = self.markup.extract_image_url(&String::from_utf8_lossy(&body)) {
                break src;
            }

            if attempts > self.retries {
                tracing::error!("Failed to locate image {}-{}", chapter, page);
                return PageOutcome::MissingImage;
            }
            tracing::warn!("No image on page {}-{}, fetching it again", chapter, page);
        };

        let image_url = match Url::parse(&page_url).and_then(|base| base.join(&src)) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::error!("Bad image URL {} on page {}-{}: {}", src, chapter, page, e);
                return PageOutcome::MissingImage;
            }
        };

        let file_name = output::page_file_name(chapter, page);
        let bytes = match self.fetcher.fetch(&image_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to download image {}: {}", file_name, e);
                return PageOutcome::FetchFailed;
            }
        };

        let path = output::page_path(&self.target_dir, chapter, page);
        match output::write_image(&path, &bytes).await {
            Ok(()) => {
                tracing::info!("Saved image: {}", file_name);
                PageOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {}", path.display(), e);
                PageOutcome::WriteFailed
            }
        }
    }

    // ===== Full Crawl =====

    /// Runs a complete crawl of every chapter
    pub async fn run(&mut self) -> Result<CrawlStats> {
        self.run_with(&RunOptions::default()).await
    }

    /// Runs a crawl and records it in the run history
    ///
    /// 1. Load the persisted chapter index, or discover and persist it
    /// 2. Download the requested chapters (all by default) in index order
    /// 3. Close the run with its traffic counters and log statistics
    ///
    /// Network and markup failures are logged and never abort the run;
    /// only storage failures are returned as errors.
    pub async fn run_with(&mut self, options: &RunOptions) -> Result<CrawlStats> {
        let run_id = self
            .storage
            .create_run(&self.series.name, &self.config_hash)?;

        let result = self.crawl(options).await;

        let stats = self.stats();
        let status = if result.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        self.storage
            .finish_run(run_id, status, stats.request_count, stats.total_bytes)?;

        result?;
        output::log_statistics(&stats);
        Ok(stats)
    }

    async fn crawl(&mut self, options: &RunOptions) -> Result<()> {
        tracing::info!("Trying to get all chapters..");

        let loaded = if options.fresh {
            tracing::info!("Ignoring saved chapter list, discovering again");
            false
        } else {
            self.load_chapter_index()?
        };

        if loaded {
            tracing::info!("Loaded chapter list, proceeding to download.");
        } else {
            let report = self.discover_chapters().await;
            if !report.completed {
                tracing::warn!(
                    "Chapter discovery incomplete after {} passes, saving {} chapters",
                    report.passes,
                    self.index.len()
                );
            }
            self.save_chapter_index()?;
            tracing::info!("Saved chapter list, proceeding to download");
        }

        let chapters: Vec<u32> = if options.chapters.is_empty() {
            self.index.keys().copied().collect()
        } else {
            options.chapters.clone()
        };

        for chapter in chapters {
            self.download_chapter(chapter).await;
        }

        tracing::info!("Finished downloading {} chapters", self.stats.chapters_visited);
        Ok(())
    }
}
