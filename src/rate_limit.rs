use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Minimum delay the arXiv API asks for between consecutive requests.
pub const ARXIV_PAGE_INTERVAL: Duration = Duration::from_millis(350);

/// Fixed-interval pacing for one external service.
///
/// `wait()` returns once at least `interval` has passed since the previous
/// `wait()` returned. The first call never blocks. There is no burst capacity
/// and no backoff. Time comes from `tokio::time`, so tests can drive it with a
/// paused clock.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Limiter for a service capped at `rpm` requests per minute.
    pub fn per_minute(rpm: u32) -> Self {
        Self::new(Duration::from_secs(60) / rpm.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let deadline = last + self.interval;
            if deadline > Instant::now() {
                debug!(delay_ms = (deadline - Instant::now()).as_millis() as u64, "pacing");
                sleep_until(deadline).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
