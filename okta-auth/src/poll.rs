//! Fixed-interval polling with a bounded failure budget.
//!
//! Push approval happens on another device, so the verifier repeatedly asks
//! the provider whether the user has answered. This module provides the loop:
//! a fixed delay between attempts, a cap on consecutive retryable failures,
//! and an optional wall-clock limit.
//!
//! Dropping the future returned by [`poll_until`] cancels polling.
//!
//! # Example
//!
//! ```rust,no_run
//! use okta_auth::poll::{poll_until, PollConfig, PollStatus};
//!
//! async fn example() {
//!     let config = PollConfig::default();
//!
//!     let result = poll_until(
//!         &config,
//!         || async { Ok::<_, std::io::Error>(PollStatus::Ready("approved")) },
//!         |_| true,
//!     )
//!     .await;
//! }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for polling behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay between consecutive attempts
    pub interval: Duration,

    /// Consecutive retryable failures tolerated before giving up
    pub max_consecutive_failures: u32,

    /// Overall wall-clock limit, unbounded when `None`
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_consecutive_failures: 6,
            timeout: None,
        }
    }
}

impl PollConfig {
    /// Create a configuration for fast polling.
    ///
    /// Useful against local or simulated providers.
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_millis(10),
            ..Self::default()
        }
    }

    /// Bound the total time spent polling.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of a single poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not resolved yet, poll again
    Pending,
    /// Resolved with a value
    Ready(T),
}

/// Why polling stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    /// A non-retryable error was returned
    Aborted(E),
    /// Too many consecutive retryable errors
    Exhausted {
        /// Consecutive failures observed
        failures: u32,
        /// Last error returned
        last: E,
    },
    /// The configured timeout elapsed
    TimedOut(Duration),
}

/// Poll until the operation resolves.
///
/// `f` is invoked once per attempt. A `Pending` result resets the failure
/// count. Errors for which `is_retryable` returns `false` stop polling
/// immediately; retryable errors stop it once `max_consecutive_failures`
/// have happened in a row. The interval is waited after every attempt that
/// does not stop the loop.
pub async fn poll_until<F, Fut, T, E, P>(
    config: &PollConfig,
    mut f: F,
    mut is_retryable: P,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, E>>,
    E: std::fmt::Debug,
    P: FnMut(&E) -> bool,
{
    let max_failures = config.max_consecutive_failures.max(1);

    let run = async {
        let mut attempt: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            attempt += 1;

            match f().await {
                Ok(PollStatus::Ready(value)) => {
                    tracing::info!(attempts = attempt, "Poll resolved");
                    return Ok(value);
                }
                Ok(PollStatus::Pending) => {
                    failures = 0;
                    tracing::debug!(attempt = attempt, "Still pending");
                }
                Err(e) if !is_retryable(&e) => {
                    tracing::debug!(error = ?e, "Error is not retryable, stopping poll");
                    return Err(PollError::Aborted(e));
                }
                Err(e) => {
                    failures += 1;
                    if failures >= max_failures {
                        tracing::error!(
                            failures = failures,
                            error = ?e,
                            "Too many consecutive poll failures"
                        );
                        return Err(PollError::Exhausted { failures, last: e });
                    }
                    tracing::warn!(
                        failures = failures,
                        max_failures = max_failures,
                        error = ?e,
                        "Poll attempt failed, retrying"
                    );
                }
            }

            sleep(config.interval).await;
        }
    };

    match config.timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .unwrap_or(Err(PollError::TimedOut(limit))),
        None => run.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            max_consecutive_failures: 3,
            timeout: None,
        }
    }

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.max_consecutive_failures, 6);
        assert_eq!(config.timeout, None);
    }

    #[tokio::test]
    async fn test_resolves_after_pending() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = poll_until(
            &config(),
            || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 4 {
                        Ok::<_, String>(PollStatus::Pending)
                    } else {
                        Ok(PollStatus::Ready(42))
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_exhausts_on_consecutive_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = poll_until(
            &config(),
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<PollStatus<i32>, _>("down")
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(
            result,
            Err(PollError::Exhausted {
                failures: 3,
                last: "down"
            })
        );
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pending_resets_failure_count() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        // fail, fail, pending, fail, fail, ready
        let result = poll_until(
            &config(),
            || {
                let counter = counter_clone.clone();
                async move {
                    match counter.fetch_add(1, Ordering::SeqCst) {
                        2 => Ok(PollStatus::Pending),
                        5 => Ok(PollStatus::Ready("done")),
                        _ => Err("flaky"),
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = poll_until(
            &config(),
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<PollStatus<i32>, _>("rejected")
                }
            },
            |_| false,
        )
        .await;

        assert_eq!(result, Err(PollError::Aborted("rejected")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_endless_pending() {
        let config = PollConfig::default().with_timeout(Duration::from_secs(60));

        let result = poll_until(
            &config,
            || async { Ok::<PollStatus<i32>, String>(PollStatus::Pending) },
            |_| true,
        )
        .await;

        assert_eq!(result, Err(PollError::TimedOut(Duration::from_secs(60))));
    }
}
