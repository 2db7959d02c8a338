//! Bounded retry with fixed or linear backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Sleep between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same pause after every failed attempt
    Fixed(Duration),
    /// `attempt x base` after the n-th failed attempt (1-based)
    Linear(Duration),
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::Linear(base) => *base * attempt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Report every n-th failure at warn level; the others are logged at debug.
    pub report_every: u32,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
            report_every: 1,
        }
    }

    pub const fn report_every(mut self, n: u32) -> Self {
        self.report_every = n;
        self
    }

    /// Same attempt count without sleeping, for tests and dry runs.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::Fixed(Duration::ZERO))
    }
}

/// Retry budgets per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicies {
    /// Establishing an SSH session
    pub connect: RetryPolicy,
    /// Uploads and downloads
    pub transfer: RetryPolicy,
    /// Local command execution
    pub local_command: RetryPolicy,
}

impl Default for ChannelPolicies {
    /// One connection trial a minute for a day, 30 transfers 10 s apart
    /// (linearly), 30 local commands a minute apart (linearly).
    fn default() -> Self {
        Self {
            connect: RetryPolicy::new(1440, Backoff::Fixed(Duration::from_secs(60))).report_every(10),
            transfer: RetryPolicy::new(30, Backoff::Linear(Duration::from_secs(10))),
            local_command: RetryPolicy::new(30, Backoff::Linear(Duration::from_secs(60))),
        }
    }
}

impl ChannelPolicies {
    pub const fn immediate(attempts: u32) -> Self {
        Self {
            connect: RetryPolicy::immediate(attempts),
            transfer: RetryPolicy::immediate(attempts),
            local_command: RetryPolicy::immediate(attempts),
        }
    }
}

/// The last error of an operation that never succeeded.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `op` receives the 1-based attempt number. No sleep follows the final attempt.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("{} succeeded at attempt {}", what, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::error!("{} failed {} times, giving up: {}", what, attempt, e);
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
            Err(e) => {
                let delay = policy.backoff.delay(attempt);
                if attempt % policy.report_every.max(1) == 0 {
                    tracing::info!(
                        "{} failed (attempt {}/{}): {}; retrying in {}s",
                        what,
                        attempt,
                        max_attempts,
                        e,
                        delay.as_secs()
                    );
                } else {
                    tracing::debug!("{} failed (attempt {}): {}", what, attempt, e);
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delay() {
        let linear = Backoff::Linear(Duration::from_secs(10));
        assert_eq!(linear.delay(1), Duration::from_secs(10));
        assert_eq!(linear.delay(3), Duration::from_secs(30));
        let fixed = Backoff::Fixed(Duration::from_secs(60));
        assert_eq!(fixed.delay(7), Duration::from_secs(60));
    }

    #[test]
    fn test_default_policies() {
        let policies = ChannelPolicies::default();
        assert_eq!(policies.connect.max_attempts, 1440);
        assert_eq!(policies.connect.report_every, 10);
        assert_eq!(policies.transfer.max_attempts, 30);
        assert_eq!(policies.local_command.backoff, Backoff::Linear(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryExhausted<String>> =
            retry(&RetryPolicy::immediate(5), "flaky op", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("attempt {} failed", attempt))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_at_bound() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryExhausted<String>> =
            retry(&RetryPolicy::immediate(4), "dead op", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("connection refused".to_string()) }
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last_error, "connection refused");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
