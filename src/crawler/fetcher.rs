//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client (browser user agent, cookie store, compression)
//! - Politeness pacing between consecutive requests
//! - Retry logic for transient failures
//! - Request and byte accounting
//!
//! Retries for transient failures live here and nowhere else.

use crate::config::CrawlerConfig;
use crate::state::CrawlState;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// User agent sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/76.0.3809.132 Safari/537.36 OPR/63.0.3368.107";

/// Result of a single request attempt
#[derive(Debug)]
pub enum FetchResult {
    /// HTTP 200 with its body
    Success {
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: Bytes,
    },

    /// The server answered with anything but 200
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, truncated body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::NetworkError { error } => error.clone(),
        }
    }
}

/// All attempts for a URL failed
#[derive(Debug, Error)]
#[error("Can't request URL {url}, gave up after {attempts} attempts ({last_error})")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Builds an HTTP client with the crawler's fixed identity
///
/// Cookies are kept in a store shared by every request made with the client,
/// so session state issued by the site persists across the crawl. reqwest
/// advertises the enabled decoders in the `Accept-Encoding` header.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .cookie_store(true)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()
}

/// Paced, retrying GET fetcher
///
/// Owns the crawl's pacing and traffic counters. A request never starts
/// before `wait` has elapsed since the previous one completed.
pub struct Fetcher {
    client: Client,
    state: CrawlState,
    wait: Duration,
    retries: u32,
    retry_after: Duration,
}

impl Fetcher {
    /// Creates a fetcher from crawler settings
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config.timeout_duration())?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            state: CrawlState::new(),
            wait: config.wait_duration(),
            retries: config.retries,
            retry_after: config.retry_after_duration(),
        }
    }

    /// Pacing and traffic counters so far
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Number of retries after a failed attempt
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// Makes at most `retries + 1` attempts, sleeping `retry_after` between
    /// them. Never panics; exhaustion is logged and returned as `FetchError`.
    pub async fn fetch(&mut self, url: &str) -> Result<Bytes, FetchError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let result = self.fetch_once(url).await;
            let last_error = match result {
                FetchResult::Success { body, .. } => return Ok(body),
                other => other.describe(),
            };

            if attempts > self.retries {
                tracing::error!("Can't request URL {}. Exceeded max retries", url);
                return Err(FetchError {
                    url: url.to_string(),
                    attempts,
                    last_error,
                });
            }

            tracing::debug!("Retrying after {:?}...", self.retry_after);
            tokio::time::sleep(self.retry_after).await;
        }
    }

    /// Performs a single paced GET request
    ///
    /// # Request Flow
    ///
    /// 1. Sleep until the pacing window allows a new request
    /// 2. Send the GET request
    /// 3. Read the whole body on HTTP 200
    /// 4. Count the request (and bytes on success) and reopen the pacing
    ///    window `wait` after completion
    pub async fn fetch_once(&mut self, url: &str) -> FetchResult {
        if let Some(delay) = self.state.time_until_next_request(Instant::now()) {
            tracing::debug!("Waiting {:?} before next request", delay);
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("Trying to get url: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.state.defer(Instant::now(), self.wait);
                let error = classify_error(&e);
                tracing::error!("Requesting {} failed: {}", url, error);
                return FetchResult::NetworkError { error };
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            self.state.record_request(Instant::now(), self.wait);
            tracing::warn!("Response code is not 200 [{}] for {}", status, url);
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            };
        }

        let body = response.bytes().await;
        self.state.record_request(Instant::now(), self.wait);

        match body {
            Ok(body) => {
                self.state.record_bytes(body.len());
                tracing::debug!("Request successful ({} bytes)", body.len());
                FetchResult::Success {
                    status_code: status.as_u16(),
                    body,
                }
            }
            Err(e) => {
                let error = classify_error(&e);
                tracing::error!("Reading body of {} failed: {}", url, error);
                FetchResult::NetworkError { error }
            }
        }
    }
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
