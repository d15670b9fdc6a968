//! Token bucket + adaptive backoff (§4.A).
//!
//! All state mutation happens behind a single mutex so the bucket behaves
//! correctly under concurrent acquirers sharing one instance.

use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Inner {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
    backoff_secs: f64,
    initial_backoff_secs: f64,
    max_backoff_secs: f64,
    backoff_multiplier: f64,
}

/// Token-bucket rate limiter shared by all callers hitting one upstream.
pub struct RateLimiter {
    inner: Mutex<Inner>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: f64, initial_backoff_secs: f64, max_backoff_secs: f64, backoff_multiplier: f64) -> Self {
        let capacity = requests_per_minute.max(1.0);
        Self {
            inner: Mutex::new(Inner {
                tokens: capacity,
                capacity,
                refill_per_sec: capacity / 60.0,
                last_refill: Instant::now(),
                backoff_secs: 0.0,
                initial_backoff_secs,
                max_backoff_secs,
                backoff_multiplier,
            }),
        }
    }

    /// Current backoff delay in seconds, without mutating state.
    pub fn current_delay(&self) -> f64 {
        self.inner.lock().unwrap().backoff_secs
    }

    pub fn max_backoff(&self) -> f64 {
        self.inner.lock().unwrap().max_backoff_secs
    }

    /// Apply a 429 response. `retry_after` overrides the exponential
    /// schedule when present and positive; otherwise the delay grows by
    /// `backoff_multiplier`, seeded at `initial_backoff_secs` if previously
    /// zero, clamped to `max_backoff_secs`.
    pub fn handle_429(&self, retry_after: Option<f64>) {
        let mut inner = self.inner.lock().unwrap();
        let max = inner.max_backoff_secs;
        inner.backoff_secs = match retry_after {
            Some(secs) if secs > 0.0 => secs.min(max),
            _ => {
                let base = if inner.backoff_secs <= 0.0 {
                    inner.initial_backoff_secs
                } else {
                    inner.backoff_secs * inner.backoff_multiplier
                };
                base.min(max)
            }
        };
    }

    /// Reset backoff to zero after a successful (2xx) response.
    pub fn reset_backoff(&self) {
        self.inner.lock().unwrap().backoff_secs = 0.0;
    }

    /// Sleep for the current backoff, then wait until a token is available,
    /// consuming it.
    pub async fn acquire(&self) {
        let delay = self.current_delay();
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }

        loop {
            let wait = {
                let mut inner = self.inner.lock().unwrap();
                inner.refill();
                if inner.tokens >= 1.0 {
                    inner.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - inner.tokens;
                    Some(Duration::from_secs_f64(deficit / inner.refill_per_sec))
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }
}

impl Inner {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_backoff_returns_to_zero() {
        let limiter = RateLimiter::new(60.0, 2.0, 300.0, 2.0);
        limiter.handle_429(None);
        assert!(limiter.current_delay() > 0.0);
        limiter.reset_backoff();
        assert_eq!(limiter.current_delay(), 0.0);
    }

    #[test]
    fn handle_429_honors_retry_after() {
        let limiter = RateLimiter::new(60.0, 2.0, 300.0, 2.0);
        limiter.handle_429(Some(30.0));
        assert_eq!(limiter.current_delay(), 30.0);
    }

    #[test]
    fn handle_429_without_header_grows_exponentially() {
        let limiter = RateLimiter::new(60.0, 2.0, 300.0, 2.0);
        limiter.handle_429(None);
        assert_eq!(limiter.current_delay(), 2.0);
        limiter.handle_429(None);
        assert_eq!(limiter.current_delay(), 4.0);
        limiter.handle_429(None);
        assert_eq!(limiter.current_delay(), 8.0);
    }

    #[test]
    fn backoff_clamped_at_max() {
        let limiter = RateLimiter::new(60.0, 2.0, 5.0, 2.0);
        for _ in 0..10 {
            limiter.handle_429(None);
        }
        assert!(limiter.current_delay() <= limiter.max_backoff());
    }

    #[test]
    fn negative_or_zero_retry_after_falls_back_to_exponential() {
        let limiter = RateLimiter::new(60.0, 2.0, 300.0, 2.0);
        limiter.handle_429(Some(-5.0));
        assert_eq!(limiter.current_delay(), 2.0);
        limiter.handle_429(Some(0.0));
        assert_eq!(limiter.current_delay(), 4.0);
    }

    #[tokio::test]
    async fn acquire_consumes_a_token() {
        let limiter = RateLimiter::new(6000.0, 0.0, 1.0, 2.0);
        limiter.acquire().await;
        let remaining = limiter.inner.lock().unwrap().tokens;
        assert!(remaining < 6000.0);
    }

    #[tokio::test]
    async fn property_delay_always_bounded() {
        let limiter = RateLimiter::new(60.0, 2.0, 60.0, 2.0);
        for _ in 0..20 {
            limiter.handle_429(None);
            let d = limiter.current_delay();
            assert!(d >= 0.0 && d <= limiter.max_backoff());
        }
        limiter.reset_backoff();
        assert_eq!(limiter.current_delay(), 0.0);
    }
}
