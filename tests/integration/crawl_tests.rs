//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the source site and test
//! the full discover → persist → download cycle end-to-end.

use mangareader_dl::config::{Config, CrawlerConfig, OutputConfig, SourceConfig};
use mangareader_dl::crawler::{Crawler, DiscoveryError, RunOptions};
use mangareader_dl::state::PageOutcome;
use mangareader_dl::storage::{index_path, ChapterIndex, ChapterRecord, ProgressStore, RunStatus, SqliteStorage};
use mangareader_dl::{validate_series_url, CrawlError};
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, target_dir: &Path, retries: u32) -> Config {
    Config {
        source: SourceConfig {
            base_url: format!("{}/", base_url),
        },
        crawler: CrawlerConfig {
            wait_time: 0.0,
            timeout: 5.0,
            retries,
            retry_after: 0.0,
        },
        output: OutputConfig {
            target_dir: target_dir.display().to_string(),
        },
    }
}

fn series_page(chapters: &[u32]) -> String {
    let rows: String = chapters
        .iter()
        .map(|n| format!(r#"<tr><td><a href="/series/{n}">Series {n}</a></td></tr>"#))
        .collect();
    format!(
        r#"<html><body><table id="chapterlist">{}</table></body></html>"#,
        rows
    )
}

fn chapter_page(page_count: u32) -> String {
    format!(
        r#"<html><body><div id="selectpage"><select id="pageMenu"></select> of {}</div>
        <img id="img" src="/images/page.jpg"></body></html>"#,
        page_count
    )
}

async fn mount_series(server: &MockServer, chapters: &[u32]) {
    Mock::given(method("GET"))
        .and(path("/series"))
        .respond_with(ResponseTemplate::new(200).set_body_string(series_page(chapters)))
        .mount(server)
        .await;
}

async fn mount_chapter(server: &MockServer, chapter: u32, page_count: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/series/{}", chapter)))
        .respond_with(ResponseTemplate::new(200).set_body_string(chapter_page(page_count)))
        .mount(server)
        .await;
}

/// Page views for every chapter and the image they point to
async fn mount_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/series/\d+/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><img id="img" src="/images/page.jpg"></body></html>"#),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/page.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE.to_vec()))
        .mount(server)
        .await;
}

fn saved_files(target: &Path) -> Vec<String> {
    let mut files = Vec::new();
    for dir in std::fs::read_dir(target).unwrap() {
        let dir = dir.unwrap().path();
        if dir.is_dir() {
            for file in std::fs::read_dir(&dir).unwrap() {
                let file = file.unwrap().path();
                let folder = dir.file_name().unwrap().to_string_lossy().to_string();
                let name = file.file_name().unwrap().to_string_lossy().to_string();
                files.push(format!("{}/{}", folder, name));
            }
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn test_full_crawl_two_chapters() {
    let server = MockServer::start().await;
    mount_series(&server, &[1, 2]).await;
    mount_chapter(&server, 1, 3).await;
    mount_chapter(&server, 2, 2).await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let stats = crawler.run().await.unwrap();

    assert_eq!(
        saved_files(dir.path()),
        vec![
            "CH-001/1-01.jpeg",
            "CH-001/1-02.jpeg",
            "CH-001/1-03.jpeg",
            "CH-002/2-01.jpeg",
            "CH-002/2-02.jpeg",
        ]
    );
    assert!(dir.path().join("series.db").exists());

    let saved = std::fs::read(dir.path().join("CH-002").join("2-02.jpeg")).unwrap();
    assert_eq!(saved, IMAGE);

    // series + 2 chapter pages + 5 × (page view + image)
    assert_eq!(stats.request_count, 13);
    assert_eq!(stats.images_saved, 5);
    assert_eq!(stats.images_failed, 0);
    assert_eq!(stats.chapters_visited, 2);
}

#[tokio::test]
async fn test_second_run_makes_no_requests() {
    let server = MockServer::start().await;
    mount_series(&server, &[1, 2]).await;
    mount_chapter(&server, 1, 3).await;
    mount_chapter(&server, 2, 2).await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let series_url = format!("{}/series", server.uri());

    Crawler::new(&series_url, &config).unwrap().run().await.unwrap();

    let mut second = Crawler::new(&series_url, &config).unwrap();
    let stats = second.run().await.unwrap();

    assert_eq!(stats.request_count, 0);
    assert_eq!(stats.images_skipped, 5);
    assert_eq!(stats.images_saved, 0);
    assert_eq!(second.chapter_index().len(), 2);
}

#[tokio::test]
async fn test_persisted_index_skips_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/series"))
        .respond_with(ResponseTemplate::new(200).set_body_string(series_page(&[1])))
        .expect(0)
        .mount(&server)
        .await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStorage::new(&index_path(dir.path(), "series")).unwrap();
    let mut index = ChapterIndex::new();
    index.insert(1, ChapterRecord::new(format!("{}/series/1", server.uri()), 2));
    store.save("series", &index).unwrap();

    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();
    let stats = crawler.run().await.unwrap();

    assert_eq!(stats.images_saved, 2);
    assert_eq!(saved_files(dir.path()), vec!["CH-001/1-01.jpeg", "CH-001/1-02.jpeg"]);
}

#[tokio::test]
async fn test_missing_page_count_is_recorded_as_unknown() {
    let server = MockServer::start().await;
    mount_series(&server, &[1, 2]).await;
    mount_chapter(&server, 1, 1).await;
    Mock::given(method("GET"))
        .and(path("/series/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>maintenance</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/series/2/\d+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let report = crawler.discover_chapters().await;
    assert!(report.completed);
    assert_eq!(report.passes, 1);
    assert_eq!(
        report.errors,
        vec![DiscoveryError::MissingPageCount {
            chapter: 2,
            url: format!("{}/series/2", server.uri()),
        }]
    );
    assert!(crawler.chapter_index()[&2].is_unknown());

    let stats = crawler.run().await.unwrap();
    assert_eq!(stats.images_saved, 1);
    assert!(dir.path().join("CH-002").is_dir());
    assert_eq!(saved_files(dir.path()), vec!["CH-001/1-01.jpeg"]);
}

#[tokio::test]
async fn test_chapters_numbered_by_link_position() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/series"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><table id="chapterlist">
            <tr><td><a href="/series/1">Series 1</a></td></tr>
            <tr><td><a href="http://">Series 2</a></td></tr>
            <tr><td><a href="/series/3">Series 3</a></td></tr>
            </table></body></html>"#,
        ))
        .mount(&server)
        .await;
    mount_chapter(&server, 1, 2).await;
    mount_chapter(&server, 3, 4).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let report = crawler.discover_chapters().await;

    assert!(report.completed);
    assert!(matches!(
        report.errors.as_slice(),
        [DiscoveryError::BadChapterLink { chapter: 2, .. }]
    ));
    let index = crawler.chapter_index();
    assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(
        index[&3],
        ChapterRecord::new(format!("{}/series/3", server.uri()), 4)
    );
}

#[tokio::test]
async fn test_zero_page_count_is_reported() {
    let server = MockServer::start().await;
    mount_series(&server, &[1]).await;
    mount_chapter(&server, 1, 0).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let report = crawler.discover_chapters().await;

    assert!(matches!(
        report.errors.as_slice(),
        [DiscoveryError::MissingPageCount { chapter: 1, .. }]
    ));
    assert!(crawler.chapter_index()[&1].is_unknown());
}

#[tokio::test]
async fn test_discovery_restarts_after_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/series"))
        .respond_with(ResponseTemplate::new(200).set_body_string(series_page(&[1])))
        .expect(2)
        .mount(&server)
        .await;
    // Outlasts the fetcher's own retry (1 retry = 2 attempts)
    Mock::given(method("GET"))
        .and(path("/series/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_chapter(&server, 1, 4).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let report = crawler.discover_chapters().await;

    assert!(report.completed);
    assert_eq!(report.passes, 2);
    assert!(report.errors.is_empty());
    assert_eq!(crawler.chapter_index()[&1].page_count, 4);
}

#[tokio::test]
async fn test_discovery_exhaustion_keeps_partial_index() {
    let server = MockServer::start().await;
    mount_series(&server, &[1, 2]).await;
    mount_chapter(&server, 1, 3).await;
    Mock::given(method("GET"))
        .and(path("/series/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let report = crawler.discover_chapters().await;

    assert!(!report.completed);
    assert_eq!(report.passes, 2);
    assert!(matches!(
        report.errors.as_slice(),
        [DiscoveryError::ChapterUnavailable { chapter: 2, .. }]
    ));
    assert_eq!(crawler.chapter_index().len(), 1);
    assert!(crawler.chapter_index().contains_key(&1));
}

#[tokio::test]
async fn test_series_without_chapters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/series"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Not found</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 3);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let report = crawler.discover_chapters().await;

    assert!(!report.completed);
    assert!(matches!(report.errors.as_slice(), [DiscoveryError::NoChapters { .. }]));
    assert!(crawler.chapter_index().is_empty());
}

#[tokio::test]
async fn test_fresh_discovery_merges_with_saved_index() {
    let server = MockServer::start().await;
    mount_series(&server, &[1, 2]).await;
    mount_chapter(&server, 1, 5).await;
    mount_chapter(&server, 2, 3).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStorage::new(&index_path(dir.path(), "series")).unwrap();
    let mut saved = ChapterIndex::new();
    saved.insert(1, ChapterRecord::new("http://old.example/series/1", 0));
    saved.insert(2, ChapterRecord::new("http://old.example/series/2", 9));
    saved.insert(7, ChapterRecord::new("http://old.example/series/7", 2));
    store.save("series", &saved).unwrap();

    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();
    crawler.discover_chapters().await;
    crawler.save_chapter_index().unwrap();

    let merged = crawler.chapter_index();
    assert_eq!(merged.len(), 3);
    // Unknown count is filled in, URL stays
    assert_eq!(merged[&1], ChapterRecord::new("http://old.example/series/1", 5));
    // Known count is never overwritten
    assert_eq!(merged[&2], ChapterRecord::new("http://old.example/series/2", 9));
    assert_eq!(merged[&7].page_count, 2);

    assert_eq!(store.load("series").unwrap().unwrap(), *merged);
}

#[tokio::test]
async fn test_selected_chapters_only() {
    let server = MockServer::start().await;
    mount_series(&server, &[1, 2]).await;
    mount_chapter(&server, 1, 2).await;
    mount_chapter(&server, 2, 2).await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    let options = RunOptions {
        fresh: false,
        chapters: vec![2, 9],
    };
    let stats = crawler.run_with(&options).await.unwrap();

    assert_eq!(stats.images_saved, 2);
    assert_eq!(saved_files(dir.path()), vec!["CH-002/2-01.jpeg", "CH-002/2-02.jpeg"]);
}

#[tokio::test]
async fn test_failed_image_does_not_stop_chapter() {
    let server = MockServer::start().await;
    mount_series(&server, &[1]).await;
    mount_chapter(&server, 1, 2).await;
    Mock::given(method("GET"))
        .and(path("/series/1/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<img id="img" src="/images/missing.jpg">"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config).unwrap();

    crawler.discover_chapters().await;
    let outcomes = crawler.download_chapter(1).await.unwrap();

    assert_eq!(outcomes, vec![PageOutcome::FetchFailed, PageOutcome::Saved]);
    assert_eq!(saved_files(dir.path()), vec!["CH-001/1-02.jpeg"]);
}

#[tokio::test]
async fn test_run_is_recorded() {
    let server = MockServer::start().await;
    mount_series(&server, &[1]).await;
    mount_chapter(&server, 1, 1).await;
    mount_pages(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 1);
    let mut crawler = Crawler::new(&format!("{}/series", server.uri()), &config)
        .unwrap()
        .with_config_hash("abc123");
    let stats = crawler.run().await.unwrap();

    let store = SqliteStorage::new(&index_path(dir.path(), "series")).unwrap();
    let runs = store.list_runs("series").unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].config_hash, "abc123");
    assert_eq!(runs[0].request_count, stats.request_count);
    assert_eq!(runs[0].total_bytes, stats.total_bytes);
    assert!(runs[0].finished_at.is_some());
}

#[test]
fn test_series_url_validation() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config("http://www.mangareader.net", dir.path(), 1);
    let base = url::Url::parse(&config.source.base_url).unwrap();

    assert!(validate_series_url("http://www.mangareader.net/onepunch-man", &base));
    assert!(validate_series_url("http://www.mangareader.net/onepunch-man/", &base));
    assert!(!validate_series_url("http://www.mangareader.net/", &base));
    assert!(!validate_series_url("http://www.mangareader.net/onepunch-man/1", &base));
    assert!(!validate_series_url("http://www.example.com/onepunch-man", &base));

    for bad in [
        "http://www.example.com/onepunch-man",
        "http://www.mangareader.net/onepunch-man/1",
        "not a url",
    ] {
        assert!(matches!(
            Crawler::new(bad, &config),
            Err(CrawlError::Url(_))
        ));
    }
    assert!(!dir.path().join("onepunch-man.db").exists());
}
