use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket that paces outgoing API calls. The client is strictly
/// sequential, so the bucket only ever has one waiter.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate,
        }
    }

    /// Block until one request token is available.
    pub async fn acquire_permit(&self) {
        loop {
            match self.try_acquire().await {
                Ok(()) => return,
                Err(wait_time) => {
                    debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }
    }

    async fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().await;

        let elapsed = state.last_refill.elapsed();
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = Instant::now();

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            Err(Duration::from_secs_f64(deficit / self.refill_rate))
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        let elapsed = state.last_refill.elapsed();
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = Instant::now();
        state.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_exhaustion() {
        let config = RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 5,
        };
        let limiter = RateLimiter::new(config);

        for _ in 0..5 {
            assert!(limiter.try_acquire().await.is_ok());
        }
        assert!(limiter.try_acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_refill_over_time() {
        let config = RateLimitConfig {
            max_requests: 60, // 1 token per second
            time_window: Duration::from_secs(60),
            burst_allowance: 2,
        };
        let limiter = RateLimiter::new(config);

        assert!(limiter.try_acquire().await.is_ok());
        assert!(limiter.try_acquire().await.is_ok());
        assert!(limiter.try_acquire().await.is_err());

        sleep(Duration::from_millis(1100)).await;
        assert!(limiter.try_acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_permit_waits() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        limiter.acquire_permit().await;
        limiter.acquire_permit().await;

        let available = limiter.available_tokens().await;
        assert!(available < 9.0);
    }
}
