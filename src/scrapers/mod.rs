//! HTML acquisition and parsing for the news source.
//!
//! Fetching is split from parsing so the collector can be driven by any
//! [`FetchHtml`] implementation:
//!
//! | Piece | Role |
//! |-------|------|
//! | [`FetchHtml`] | async "URL in, HTML body out" seam |
//! | [`HttpFetcher`] | `reqwest` implementation with timeout and user agent |
//! | [`RequestSpacer`] | minimum spacing between requests, shared by all workers |
//! | [`naver`] | section-page headline parser |

pub mod naver;

use crate::config::ScrapingConfig;
use crate::error::{NewsError, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep_until;
use tracing::{debug, info, instrument, warn};

/// Async source of HTML documents.
pub trait FetchHtml {
    /// GET `url` and return the response body.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScrapingConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en;q=0.8"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| NewsError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl FetchHtml for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                NewsError::Network(format!("timed out fetching {}", url))
            } else {
                NewsError::Network(format!("request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(%url, "source is throttling requests");
            return Err(NewsError::RateLimit(format!("{} returned {}", url, status)));
        }
        if !status.is_success() {
            return Err(NewsError::Network(format!("{} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NewsError::Network(format!("failed reading body of {}: {}", url, e)))?;
        info!(%url, bytes = body.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "Fetched page");
        Ok(body)
    }
}

/// Soft global rate limiter: consecutive dispatches are at least `delay` apart,
/// no matter how many workers are waiting.
#[derive(Debug)]
pub struct RequestSpacer {
    delay: Duration,
    last: Mutex<Option<tokio::time::Instant>>,
}

impl RequestSpacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Wait for this caller's slot. Holding the lock while sleeping serializes
    /// the spacing across workers.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let next = prev + self.delay;
            if next > tokio::time::Instant::now() {
                debug!(delay = ?self.delay, "Spacing request");
                sleep_until(next).await;
            }
        }
        *last = Some(tokio::time::Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spacer_enforces_minimum_gap() {
        let spacer = RequestSpacer::new(Duration::from_millis(40));
        let t0 = Instant::now();
        spacer.wait().await;
        spacer.wait().await;
        spacer.wait().await;
        assert!(t0.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_spacer_first_call_does_not_wait() {
        let spacer = RequestSpacer::new(Duration::from_secs(10));
        let t0 = Instant::now();
        spacer.wait().await;
        assert!(t0.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spacer_is_shared_across_workers() {
        let spacer = RequestSpacer::new(Duration::from_millis(30));
        let t0 = Instant::now();
        futures::join!(spacer.wait(), spacer.wait(), spacer.wait(), spacer.wait());
        assert!(t0.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_http_fetcher_builds_from_defaults() {
        let fetcher = HttpFetcher::new(&ScrapingConfig::default());
        assert!(fetcher.is_ok());
    }
}
