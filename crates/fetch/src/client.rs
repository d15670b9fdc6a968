//! Process-wide rate-limited HTTP client (§4.A, §5).
//!
//! One [`reqwest::Client`] is built on first use and shared across every
//! source adapter via `Arc`; each upstream host gets its own
//! [`RateLimiter`] so a slow Reddit-like backoff never throttles a
//! Mastodon-like one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::rate_limit::RateLimiter;

pub struct RateLimitedFetcher {
    client: Client,
    limiters: Mutex<HashMap<String, Arc<RateLimiter>>>,
    default_rpm: f64,
    initial_backoff_secs: f64,
    max_backoff_secs: f64,
    backoff_multiplier: f64,
}

impl RateLimitedFetcher {
    pub fn new(default_rpm: f64, initial_backoff_secs: f64, max_backoff_secs: f64, backoff_multiplier: f64) -> Self {
        let client = Client::builder()
            .user_agent("gazette-fetch/0.1")
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build shared HTTP client");

        Self {
            client,
            limiters: Mutex::new(HashMap::new()),
            default_rpm,
            initial_backoff_secs,
            max_backoff_secs,
            backoff_multiplier,
        }
    }

    fn limiter_for(&self, bucket: &str) -> Arc<RateLimiter> {
        let mut limiters = self.limiters.lock().unwrap();
        limiters
            .entry(bucket.to_string())
            .or_insert_with(|| {
                Arc::new(RateLimiter::new(
                    self.default_rpm,
                    self.initial_backoff_secs,
                    self.max_backoff_secs,
                    self.backoff_multiplier,
                ))
            })
            .clone()
    }

    /// GET `url`, honoring the per-`bucket` rate limiter and feeding 429/2xx
    /// responses back into its backoff state.
    pub async fn get(&self, bucket: &str, url: &str) -> Result<String, FetchError> {
        let limiter = self.limiter_for(bucket);
        limiter.acquire().await;

        debug!(bucket, url, "fetching");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok());
            limiter.handle_429(retry_after);
            warn!(bucket, url, ?retry_after, "rate limited by upstream");
            return Err(FetchError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UpstreamStatus { status: status.as_u16(), body });
        }

        limiter.reset_backoff();
        response.text().await.map_err(FetchError::Request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_buckets_get_distinct_limiters() {
        let fetcher = RateLimitedFetcher::new(60.0, 2.0, 300.0, 2.0);
        let a = fetcher.limiter_for("reddit");
        let b = fetcher.limiter_for("mastodon");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn same_bucket_shares_limiter_state() {
        let fetcher = RateLimitedFetcher::new(60.0, 2.0, 300.0, 2.0);
        let a = fetcher.limiter_for("reddit");
        a.handle_429(None);
        let b = fetcher.limiter_for("reddit");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(b.current_delay() > 0.0);
    }
}
