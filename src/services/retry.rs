use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::warn;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DELAY: Duration = Duration::from_millis(5_000);

/// Bounded, fixed-delay retry applied to operations that lose an optimistic-lock race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below one are raised to one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Total number of calls, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause between two consecutive calls.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of attempts. The last error is returned on exhaustion.
///
/// Each call of `operation` must start from scratch (re-read, re-apply, re-write),
/// so that a retry observes the state left by the concurrent winner.
pub async fn retry_on<T, E, P, F, Fut>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "operation hit a concurrent modification; retrying"
                );
                attempt += 1;
                sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
