use std::future::Future;
use std::time::Duration;

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 40;

/// Fixed-interval retry ceiling for waiting on DNS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PropagationPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time `wait_for` can spend sleeping.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }

    /// Calls `check` with the 1-based attempt number until it returns `true` or the
    /// attempts run out. Sleeps `interval` between attempts, never after the last one.
    pub async fn wait_for<F, Fut>(&self, mut check: F) -> bool
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = bool>,
    {
        for attempt in 1..=self.max_attempts {
            if check(attempt).await {
                return true;
            }
            if attempt < self.max_attempts {
                tracing::debug!(
                    "Attempt {}/{} failed, retrying in {:?}",
                    attempt,
                    self.max_attempts,
                    self.interval
                );
                tokio::time::sleep(self.interval).await;
            }
        }
        false
    }
}
