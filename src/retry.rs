//! Bounded exponential-backoff retry around remote provider calls.
//!
//! The engine needs to report how many attempts a translation consumed, so
//! the helpers here return the attempt count alongside the value or the
//! terminal error instead of swallowing it.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before a given attempt (0-indexed; the first attempt never waits).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay_ms =
            self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }
}

/// A value obtained after zero or more failed attempts.
#[derive(Debug)]
pub struct Retried<T> {
    pub value: T,
    /// Failed attempts consumed before success
    pub failed_attempts: u32,
}

/// Terminal retry outcome.
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// Every attempt in the budget failed; carries the last error
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with a non-retryable error; no further attempts made
    Aborted { attempts: u32, error: E },
}

impl<E> RetryFailure<E> {
    /// Attempts consumed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryFailure::Exhausted { attempts, .. } => *attempts,
            RetryFailure::Aborted { attempts, .. } => *attempts,
        }
    }

    /// The underlying error of the final attempt.
    pub fn into_error(self) -> E {
        match self {
            RetryFailure::Exhausted { last, .. } => last,
            RetryFailure::Aborted { error, .. } => error,
        }
    }
}

/// Execute an async operation with bounded exponential-backoff retries.
///
/// `should_retry` decides whether a given error is transient; a non-retryable
/// error aborts immediately without consuming the remaining budget.
///
/// # Panics
/// Panics if `config.max_attempts` is 0
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<Retried<T>, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    assert!(
        config.max_attempts >= 1,
        "RetryConfig.max_attempts must be >= 1, got {}",
        config.max_attempts
    );

    let mut last_error: Option<E> = None;

    for attempt in 0..config.max_attempts {
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: retry attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                config.max_attempts,
                delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        "{}: succeeded on attempt {}/{}",
                        operation_name,
                        attempt + 1,
                        config.max_attempts
                    );
                }
                return Ok(Retried {
                    value,
                    failed_attempts: attempt,
                });
            }
            Err(e) => {
                if !should_retry(&e) {
                    debug!(
                        "{}: error is not retryable, failing immediately: {}",
                        operation_name, e
                    );
                    return Err(RetryFailure::Aborted {
                        attempts: attempt + 1,
                        error: e,
                    });
                }

                let remaining = config.max_attempts - attempt - 1;
                if remaining > 0 {
                    warn!(
                        "{}: attempt {}/{} failed ({}), {} retries remaining",
                        operation_name,
                        attempt + 1,
                        config.max_attempts,
                        e,
                        remaining
                    );
                } else {
                    warn!(
                        "{}: all {} attempts failed. Last error: {}",
                        operation_name, config.max_attempts, e
                    );
                }
                last_error = Some(e);
            }
        }
    }

    Err(RetryFailure::Exhausted {
        attempts: config.max_attempts,
        last: last_error.expect("at least one attempt should have been made"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    // ==================== Delay Calculation Tests ====================

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig::new(4, Duration::from_secs(1)).with_backoff_multiplier(2.0);

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_respects_max() {
        let config = RetryConfig::new(10, Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_backoff_multiplier(2.0);

        // Attempt 4 would be 8 seconds, but max is 3
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(3));
    }

    #[test]
    fn test_delay_first_attempt_always_zero() {
        let config = RetryConfig::new(10, Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RetryConfig::new(2, Duration::from_millis(50))
            .with_max_delay(Duration::from_secs(10))
            .with_backoff_multiplier(1.5);

        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.base_delay, Duration::from_millis(50));
        assert_eq!(config.max_delay, Duration::from_secs(10));
        assert!((config.backoff_multiplier - 1.5).abs() < f64::EPSILON);
    }

    // ==================== Success Paths ====================

    #[tokio::test]
    async fn test_succeeds_first_attempt_reports_zero_failed() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<Retried<u32>, RetryFailure<&str>> = retry_with_backoff(
            &config,
            "test",
            || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                }
            },
            |_| true,
        )
        .await;

        let retried = result.unwrap();
        assert_eq!(retried.value, 42);
        assert_eq!(retried.failed_attempts, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures_counts_them() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<Retried<u32>, RetryFailure<&str>> = retry_with_backoff(
            &config,
            "test",
            || {
                let c = counter_clone.clone();
                async move {
                    let attempt = c.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err("temporary failure")
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;

        let retried = result.unwrap();
        assert_eq!(retried.value, 42);
        assert_eq!(retried.failed_attempts, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    // ==================== Terminal Failures ====================

    #[tokio::test]
    async fn test_exhaustion_carries_attempt_count_and_last_error() {
        let config = RetryConfig::new(3, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<Retried<u32>, RetryFailure<String>> = retry_with_backoff(
            &config,
            "test",
            || {
                let c = counter_clone.clone();
                async move {
                    let attempt = c.fetch_add(1, Ordering::SeqCst);
                    Err(format!("error on attempt {}", attempt + 1))
                }
            },
            |_| true,
        )
        .await;

        match result {
            Err(RetryFailure::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, "error on attempt 3");
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_aborts_immediately() {
        let config = RetryConfig::new(5, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<Retried<u32>, RetryFailure<&str>> = retry_with_backoff(
            &config,
            "test",
            || {
                let c = counter_clone.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("client error 400")
                }
            },
            |e: &&str| !e.contains("400"),
        )
        .await;

        match result {
            Err(RetryFailure::Aborted { attempts, error }) => {
                assert_eq!(attempts, 1);
                assert_eq!(error, "client error 400");
            }
            other => panic!("expected Aborted, got {:?}", other),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_then_non_retryable() {
        let config = RetryConfig::new(5, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<Retried<&str>, RetryFailure<&str>> = retry_with_backoff(
            &config,
            "test",
            || {
                let c = counter_clone.clone();
                async move {
                    match c.fetch_add(1, Ordering::SeqCst) {
                        0 => Err("500 server error"),
                        _ => Err("400 bad request"),
                    }
                }
            },
            |e: &&str| e.contains("500"),
        )
        .await;

        match result {
            Err(RetryFailure::Aborted { attempts, error }) => {
                assert_eq!(attempts, 2);
                assert_eq!(error, "400 bad request");
            }
            other => panic!("expected Aborted, got {:?}", other),
        }
    }

    // ==================== RetryFailure Accessors ====================

    #[test]
    fn test_failure_accessors() {
        let exhausted: RetryFailure<&str> = RetryFailure::Exhausted {
            attempts: 3,
            last: "boom",
        };
        assert_eq!(exhausted.attempts(), 3);
        assert_eq!(exhausted.into_error(), "boom");

        let aborted: RetryFailure<&str> = RetryFailure::Aborted {
            attempts: 1,
            error: "nope",
        };
        assert_eq!(aborted.attempts(), 1);
        assert_eq!(aborted.into_error(), "nope");
    }

    // ==================== Timing ====================

    #[tokio::test]
    async fn test_exponential_backoff_timing() {
        let config = RetryConfig::new(3, Duration::from_millis(50)).with_backoff_multiplier(2.0);

        let start = std::time::Instant::now();

        let _result: Result<Retried<()>, RetryFailure<&str>> =
            retry_with_backoff(&config, "timing_test", || async { Err("always fails") }, |_| {
                true
            })
            .await;

        let elapsed = start.elapsed();

        // Should have waited: 0ms + 50ms + 100ms = 150ms minimum
        assert!(
            elapsed >= Duration::from_millis(100),
            "expected at least 100ms delay, got {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_no_delay_on_immediate_success() {
        let config = RetryConfig::new(3, Duration::from_secs(10));

        let start = std::time::Instant::now();

        let result: Result<Retried<i32>, RetryFailure<&str>> =
            retry_with_backoff(&config, "immediate", || async { Ok(42) }, |_| true).await;

        assert!(result.is_ok());
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "expected quick completion"
        );
    }

    // ==================== Zero Attempts Panic ====================

    #[tokio::test]
    #[should_panic(expected = "max_attempts must be >= 1")]
    async fn test_panics_on_zero_attempts() {
        let config = RetryConfig::new(0, Duration::from_millis(100));

        let _result: Result<Retried<()>, RetryFailure<&str>> =
            retry_with_backoff(&config, "zero", || async { Ok(()) }, |_| true).await;
    }
}
