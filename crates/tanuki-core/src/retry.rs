//! Retry with exponential backoff around a single remote call.
//!
//! Pagers never retry on their own. Stages wrap each fetch with a
//! [`RetryPolicy`], which only retries errors that report
//! [`Error::is_recoverable`](crate::Error::is_recoverable).

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::Result;

/// How many times, and how patiently, to retry a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Total number of attempts (first call included). Zero is treated as one.
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Delay before the first retry.
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Upper bound for any single delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Total attempts, including the first.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `retry` (0-based).
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `op`.
    pub async fn run<F, Fut, T>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && attempt + 1 < self.attempts => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "{what} failed ({err}); retrying in {}ms (attempt {}/{})",
                        delay.as_millis(),
                        attempt + 1,
                        self.attempts
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_attempts(attempts)
            .with_base_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = fast(3)
            .run("groups", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Transient("503".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(2)
            .run("groups", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Transient("429".into()))
            })
            .await;
        assert!(matches!(result, Err(Error::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(5)
            .run("groups", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Authentication("401".into()))
            })
            .await;
        assert!(matches!(result, Err(Error::Authentication(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(200));
        assert_eq!(policy.backoff(1), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_secs(2));
        assert_eq!(RetryPolicy::none().with_attempts(0).attempts(), 1);
    }
}
