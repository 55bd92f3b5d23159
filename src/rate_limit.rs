use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Fixed pause before each translation request, to stay inside provider quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay. Does not depend on how the previous call went.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!("Waiting {:?} before next translation request", self.delay);
        sleep(self.delay).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
