//! Bounded retry for transient faults.
//!
//! Every page interaction goes through [`retry`]: the operation is re-run
//! (re-locating its element each time) while it fails with a transient error
//! and attempts remain. The last error is handed back to the caller, which
//! decides whether the fault is fatal for the job.
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as worth another attempt.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(300), Duration::from_secs(3))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// Single attempt, no waiting.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy's attempts
/// are spent. Backoff doubles between attempts up to `max_backoff`.
///
/// ```
/// use applybot_common::retry::{retry, Retryable, RetryPolicy};
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// struct Flaky;
/// impl Retryable for Flaky {
///     fn is_transient(&self) -> bool { true }
/// }
/// impl std::fmt::Display for Flaky {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "flaky") }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2));
/// let mut calls = 0;
/// let out = retry(&policy, "demo", || {
///     calls += 1;
///     let attempt = calls;
///     async move { if attempt < 3 { Err(Flaky) } else { Ok(attempt) } }
/// })
/// .await;
/// assert_eq!(out.unwrap(), 3);
/// # });
/// ```
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, action: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let wait = policy.backoff_after(attempt);
                tracing::debug!(
                    target: "applybot::retry",
                    action,
                    attempt,
                    error = %err,
                    wait_ms = wait.as_millis() as u64,
                    "transient fault; retrying"
                );
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
                attempt += 1;
            }
            Err(err) => {
                if attempt > 1 {
                    tracing::debug!(target: "applybot::retry", action, attempt, error = %err, "giving up");
                }
                return Err(err);
            }
        }
    }
}
