use std::time::Duration;
use tokio::time::Instant;

/// Pacing and traffic accounting for one fetcher
///
/// Holds the earliest instant the next request may start plus the
/// cumulative request and byte counters. A fresh state allows an immediate
/// first request.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    /// Number of requests that received a response
    pub request_count: u64,

    /// Bytes received in successful responses
    pub total_bytes: u64,

    /// Earliest start of the next request
    next_request_at: Option<Instant>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before the next request may start, None if it may start now
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        match self.next_request_at {
            Some(at) if at > now => Some(at - now),
            _ => None,
        }
    }

    /// The instant the next request may start, if pacing is in effect
    pub fn next_request_at(&self) -> Option<Instant> {
        self.next_request_at
    }

    /// Records a completed request and pushes the next allowed start `wait` past `now`
    pub fn record_request(&mut self, now: Instant, wait: Duration) {
        self.request_count += 1;
        self.next_request_at = Some(now + wait);
    }

    /// Pushes the next allowed start without counting a request
    ///
    /// Used for attempts that never got a response (timeouts, refused connections).
    pub fn defer(&mut self, now: Instant, wait: Duration) {
        self.next_request_at = Some(now + wait);
    }

    pub fn record_bytes(&mut self, bytes: usize) {
        self.total_bytes += bytes as u64;
    }
}
