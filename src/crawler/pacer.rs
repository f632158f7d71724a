//! Request pacing for the target site
//!
//! Every request to the site, whether listing page, product page or asset,
//! waits for its turn here so that consecutive requests are at least
//! `min-request-interval-ms` apart. The pacer is shareable across tasks.

use crate::config::HttpConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Shared request-rate limiter
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum time between two requests
    min_interval: Duration,

    /// When the last request was released
    last_request: Mutex<Option<Instant>>,

    /// Number of requests released so far
    request_count: AtomicU64,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new(Duration::from_millis(config.min_request_interval_ms))
    }

    /// Waits until a request may be sent, then records it
    ///
    /// The lock is held while sleeping so concurrent callers are released one
    /// interval apart.
    pub async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(wait) = time_until_next_request(*last, self.min_interval, Instant::now()) {
            tracing::trace!("Pacing request for {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        *last = Some(Instant::now());
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of requests released so far
    pub fn requests_made(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Calculates the time until the next request can be made
///
/// Returns None if a request can be made now, or the duration to wait otherwise.
pub fn time_until_next_request(
    last: Option<Instant>,
    min_interval: Duration,
    now: Instant,
) -> Option<Duration> {
    let last = last?;
    let elapsed = now.saturating_duration_since(last);
    if elapsed < min_interval {
        Some(min_interval - elapsed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_immediate() {
        assert_eq!(
            time_until_next_request(None, Duration::from_secs(1), Instant::now()),
            None
        );
    }

    #[test]
    fn test_wait_after_recent_request() {
        let last = Instant::now();
        let now = last + Duration::from_millis(300);

        let wait = time_until_next_request(Some(last), Duration::from_millis(1000), now);
        assert_eq!(wait, Some(Duration::from_millis(700)));
    }

    #[test]
    fn test_no_wait_after_interval() {
        let last = Instant::now();
        let now = last + Duration::from_millis(1500);

        assert_eq!(
            time_until_next_request(Some(last), Duration::from_millis(1000), now),
            None
        );
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let now = Instant::now();
        assert_eq!(time_until_next_request(Some(now), Duration::ZERO, now), None);
    }

    #[tokio::test]
    async fn test_wait_turn_spaces_requests() {
        let pacer = RequestPacer::new(Duration::from_millis(50));
        let start = Instant::now();

        pacer.wait_turn().await;
        pacer.wait_turn().await;
        pacer.wait_turn().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(pacer.requests_made(), 3);
    }
}
