//! Markup extraction for the source site
//!
//! This module turns the three kinds of pages the crawler visits into data:
//! - series page → ordered chapter links
//! - chapter page → page count
//! - page view → image URL
//!
//! Extraction is pure (no network, no file I/O). Missing markup is a normal
//! outcome reported as `None` or an empty list.

use scraper::{Html, Selector};

/// Extraction capability the crawl controller depends on
///
/// Supporting another site's markup means providing another implementation.
pub trait MarkupExtractor {
    /// Chapter links of a series page, in document order
    ///
    /// The hrefs are returned as written in the page (usually relative).
    /// An empty list means no chapters were found.
    fn extract_chapter_links(&self, html: &str) -> Vec<String>;

    /// Page count of a chapter page, None when the marker is missing or reads 0
    fn extract_page_count(&self, html: &str) -> Option<u32>;

    /// Image URL of a page view, None when the image element is missing
    fn extract_image_url(&self, html: &str) -> Option<String>;
}

/// Markup of mangareader.net
///
/// - chapter links: `#chapterlist a[href]`
/// - page count: last number in the text of `div#selectpage`
///   (`<select>…</select> of 45`)
/// - image: `src` of `img#img`
#[derive(Debug, Clone, Copy, Default)]
pub struct MangaReaderMarkup;

const CHAPTER_LINK_SELECTOR: &str = "#chapterlist a[href]";
const PAGE_COUNT_SELECTOR: &str = "div#selectpage";
const IMAGE_SELECTOR: &str = "img#img";

impl MarkupExtractor for MangaReaderMarkup {
    fn extract_chapter_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse(CHAPTER_LINK_SELECTOR) else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn extract_page_count(&self, html: &str) -> Option<u32> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(PAGE_COUNT_SELECTOR).ok()?;

        let text = document
            .select(&selector)
            .next()?
            .text()
            .collect::<String>();

        text.split_whitespace()
            .last()?
            .parse()
            .ok()
            .filter(|count: &u32| *count > 0)
    }

    fn extract_image_url(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(IMAGE_SELECTOR).ok()?;

        document
            .select(&selector)
            .next()?
            .value()
            .attr("src")
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .map(str::to_string)
    }
}
