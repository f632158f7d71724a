//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests for HTML pages, JSON listings and binary assets
//! - Retry logic for throttled and transient failures
//! - Error classification

use crate::config::HttpConfig;
use crate::FetchError;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::pacer::RequestPacer;

pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";
pub const ACCEPT_ANY: &str = "*/*";

/// Longest backoff the fetcher will sleep for between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// A successfully fetched text response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Response body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::HttpConfig;
/// use catalog_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Paced, retrying HTTP fetcher
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return the response |
/// | HTTP 429 | Retry after `Retry-After` or backoff |
/// | HTTP 500, 502, 503, 504 | Retry with exponential backoff |
/// | Timeout | Retry with exponential backoff |
/// | Other HTTP status | Immediate failure |
/// | Connection refused | Immediate failure |
pub struct Fetcher {
    client: Client,
    pacer: Arc<RequestPacer>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    /// Creates a fetcher with its own client and pacer
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let pacer = Arc::new(RequestPacer::from_config(config));
        Ok(Self::with_parts(client, pacer, config))
    }

    /// Creates a fetcher sharing an existing client and pacer
    pub fn with_parts(client: Client, pacer: Arc<RequestPacer>, config: &HttpConfig) -> Self {
        Self {
            client,
            pacer,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub fn pacer(&self) -> &Arc<RequestPacer> {
        &self.pacer
    }

    /// Fetches a page and returns its body as text
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.fetch_response(url, ACCEPT_HTML).await?;

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            final_url,
            status_code,
            content_type,
            body,
        })
    }

    /// Fetches a URL and decodes the body as JSON
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.fetch_response(url, ACCEPT_JSON).await?;
        let bytes = response.bytes().await.map_err(|e| classify_error(url, e))?;

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Sends a GET request, retrying throttled and transient failures
    ///
    /// Only successful (2xx) responses are returned; the body is left unread so
    /// callers can stream it.
    pub async fn fetch_response(&self, url: &str, accept: &str) -> Result<Response, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            self.pacer.wait_turn().await;
            tracing::debug!("GET {} (attempt {})", url, attempt + 1);

            let error = match self.client.get(url).header(ACCEPT, accept).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if !is_retryable_status(status) || attempt >= self.max_retries {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    let delay =
                        retry_after(&response).unwrap_or_else(|| self.backoff_for(attempt));
                    tracing::warn!(
                        "HTTP {} for {}, retrying in {:?} ({}/{})",
                        status.as_u16(),
                        url,
                        delay,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => e,
            };

            if error.is_timeout() && attempt < self.max_retries {
                let delay = self.backoff_for(attempt);
                tracing::warn!(
                    "Timeout for {}, retrying in {:?} ({}/{})",
                    url,
                    delay,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(classify_error(url, error));
        }
    }

    /// Exponential backoff: `retry_backoff * 2^attempt`, capped
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.retry_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Statuses the site uses to shed load
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Reads a `Retry-After` header given in seconds
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}

/// Maps a reqwest error onto the fetch error kinds
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            source: error,
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
