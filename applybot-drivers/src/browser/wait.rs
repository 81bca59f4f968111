//! Bounded polling waits.
//!
//! Page state is read only after it has settled: callers poll a check at a
//! fixed interval until it reports a value or the deadline passes, instead
//! of sleeping for a fixed time.
use crate::browser::error::InteractionError;
use applybot_common::retry::Retryable;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Poll `check` until it yields `Some`, the timeout elapses (`Ok(None)`), or it
/// fails with a permanent error. Transient check errors count as "not yet".
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<Option<T>, InteractionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, InteractionError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match check().await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(err) if err.is_transient() => {
                tracing::trace!(error = %err, "not ready yet");
            }
            Err(err) => return Err(err),
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn returns_once_the_check_is_ready() {
        let calls = Cell::new(0);
        let out = poll_until(Duration::from_secs(1), Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(InteractionError::Stale("x".into()))
                } else {
                    Ok(Some(n))
                }
            }
        })
        .await;
        assert_eq!(out, Ok(Some(3)));
    }

    #[tokio::test]
    async fn times_out_with_none() {
        let out: Result<Option<()>, _> =
            poll_until(Duration::from_millis(20), Duration::from_millis(5), || async {
                Ok(None)
            })
            .await;
        assert_eq!(out, Ok(None));
    }

    #[tokio::test]
    async fn permanent_errors_stop_polling() {
        let out: Result<Option<()>, _> =
            poll_until(Duration::from_secs(5), Duration::from_millis(1), || async {
                Err(InteractionError::SessionLost("gone".into()))
            })
            .await;
        assert!(matches!(out, Err(InteractionError::SessionLost(_))));
    }
}
