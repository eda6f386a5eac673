//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;
use vintel_core::Result;
use vintel_core::config::RetrySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before attempt `failed + 1`, after `failed` failures.
    pub fn delay_for(&self, failed: u32) -> Duration {
        let exponent = failed.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "[Retry] {} failed (attempt {}/{}), retrying in {:?}: {}",
                        label,
                        attempt,
                        self.max_attempts,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::warn!(
                            "[Retry] {} gave up after {} attempts: {}",
                            label,
                            attempt,
                            err
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.base_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;
    use vintel_core::VintelError;

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fail_succeed() {
        let policy = RetryPolicy::default();
        let calls: Mutex<Vec<Instant>> = Mutex::new(Vec::new());

        let result = policy
            .run("status", || {
                let mut calls = calls.lock().unwrap();
                calls.push(Instant::now());
                let n = calls.len();
                async move {
                    if n < 3 {
                        Err(VintelError::network("connection refused"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Mutex::new(0);

        let result: Result<()> = policy
            .run("generate", || {
                *calls.lock().unwrap() += 1;
                async { Err(VintelError::server(500, "Generation failed")) }
            })
            .await;

        assert!(result.unwrap_err().is_server());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = Mutex::new(0);

        let result: Result<()> = policy
            .run("messages", || {
                *calls.lock().unwrap() += 1;
                async { Err(VintelError::network("timeout")) }
            })
            .await;

        assert!(result.unwrap_err().is_network());
        assert_eq!(*calls.lock().unwrap(), 3);
    }
}
