//! Token-bucket rate limiting for order submission.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Admits at most `rate_rps` submissions per rolling one-second window.
pub struct RateLimiter {
    rate_rps: u32,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(rate_rps: u32) -> Self {
        Self {
            rate_rps: rate_rps.max(1),
            timestamps: Mutex::new(VecDeque::with_capacity(rate_rps as usize)),
        }
    }

    fn can_send(&self) -> bool {
        self.cleanup();
        self.timestamps.lock().len() < self.rate_rps as usize
    }

    fn record_send(&self) {
        self.timestamps.lock().push_back(Instant::now());
    }

    fn cleanup(&self) {
        let cutoff = Instant::now() - Duration::from_secs(1);
        let mut timestamps = self.timestamps.lock();
        while timestamps.front().is_some_and(|&t| t < cutoff) {
            timestamps.pop_front();
        }
    }

    /// Blocks until one token is admitted. Never times out — the caller
    /// relies on the bucket advancing, matching the rate-limit-wait-is-
    /// unbounded contract of `Execute` step 4.
    pub async fn acquire(&self) {
        while !self.can_send() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.record_send();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_configured_rate_without_blocking_long() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
