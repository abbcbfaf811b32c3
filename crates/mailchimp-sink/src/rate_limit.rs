//! Token-bucket pacing for destination writes.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Bucket {
    tokens: f64,
    updated: Instant,
}

/// Token bucket with continuous refill.
///
/// The bucket starts full, so bursts up to the configured rate go through
/// unthrottled; sustained traffic settles at `capacity` permits per second.
/// State is read and written under one async mutex that stays held across
/// the wait, so concurrent callers cannot double-spend permits.
pub struct RateLimiter {
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// A limiter allowing `rate` permits per second.
    pub fn new(rate: u32) -> Self {
        RateLimiter {
            capacity: f64::from(rate),
            bucket: Mutex::new(Bucket {
                tokens: f64::from(rate),
                updated: Instant::now(),
            }),
        }
    }

    /// Consume one permit, sleeping until the bucket can cover it.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.updated).as_secs_f64();
        bucket.updated = now;
        bucket.tokens = (bucket.tokens + elapsed * self.capacity).min(self.capacity);

        if bucket.tokens < 1.0 {
            let wait = (1.0 - bucket.tokens) / self.capacity;
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
            bucket.updated = Instant::now();
            bucket.tokens = 0.0;
        } else {
            bucket.tokens -= 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_capacity_is_not_throttled() {
        let limiter = RateLimiter::new(10);

        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_excess_permits_wait_at_the_configured_rate() {
        let limiter = RateLimiter::new(10);

        // 15 permits against a capacity of 10: the last five each wait
        // 1/10s, 500ms in total.
        let start = Instant::now();
        for _ in 0..15 {
            limiter.acquire().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(520), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bucket_refills_while_idle() {
        let limiter = RateLimiter::new(2);

        limiter.acquire().await;
        limiter.acquire().await;

        // One second of idle refill at rate 2 restores two permits.
        tokio::time::advance(Duration::from_secs(1)).await;
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new(2);

        // A long idle stretch must not bank more than `capacity` permits.
        tokio::time::advance(Duration::from_secs(60)).await;
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquirers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(1));

        let start = Instant::now();
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // First permit is free, the other two wait a full second each.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
    }
}
