//! Linear-backoff retry for transient delivery failures.

use std::future::Future;
use std::time::Duration;

use crate::error::FactureError;

/// How many times to attempt an operation, and how long to pause
/// between attempts. The pause grows linearly: attempt n waits
/// `base_delay * n` before attempt n+1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Mail relay rejections are frequently rate-limiting; three
    /// attempts with growing pauses ride them out.
    pub fn mail_relay() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Pause before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Run an operation under a retry policy.
///
/// Only transient errors (timeouts, unreachable network) are retried;
/// configuration and authorization failures surface immediately since
/// they need operator action, not patience.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, FactureError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FactureError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                println!(
                    "[delivery] {} attempt {}/{} failed ({}), retrying in {:?}",
                    label, attempt, policy.max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
