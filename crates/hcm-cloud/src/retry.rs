//! Retry policy with exponential backoff

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Upper bound of any single delay
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Final state of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub attempts: u32,
    pub result: Result<T, E>,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Default::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    /// Run `op` until it succeeds, `retryable` says no, or attempts run out
    pub async fn run<T, E, F, Fut>(
        &self,
        mut op: F,
        retryable: impl Fn(&E) -> bool,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = op(attempt).await;
            match result {
                Err(ref err) if attempt < max_attempts && retryable(err) => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => {
                    return RetryOutcome {
                        attempts: attempt,
                        result,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.delay_for(1), Duration::from_millis(500));
        assert_eq!(config.delay_for(2), Duration::from_secs(1));
        assert_eq!(config.delay_for(3), Duration::from_secs(2));
        assert_eq!(config.delay_for(4), Duration::from_secs(3));
        assert_eq!(config.delay_for(9), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(3, Duration::from_millis(10));

        let outcome: RetryOutcome<(), String> = config
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("unavailable".to_string()) }
                },
                |_| true,
            )
            .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(outcome.result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_retry_permanent_errors() {
        let config = RetryConfig::new(5, Duration::from_millis(10));
        let outcome: RetryOutcome<(), &str> =
            config.run(|_| async { Err("bad request") }, |_| false).await;
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_succeeds_on_later_attempt() {
        let config = RetryConfig::new(4, Duration::from_millis(10));
        let outcome: RetryOutcome<u32, &str> = config
            .run(
                |attempt| async move { if attempt < 3 { Err("flaky") } else { Ok(attempt) } },
                |_| true,
            )
            .await;
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result.unwrap(), 3);
    }
}
