//! Retry wrapper for outbound calls.
//!
//! [`with_retry`] wraps any closure that produces a future, so retry can be
//! layered over a request function without the function knowing about it.
//! Backoff is linear: attempt `n` (1-based) waits `backoff * n` before
//! re-running. Only [`UpstreamError::is_transient`] errors are retried.

use std::future::Future;
use std::time::Duration;

use crate::error::UpstreamError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn linear(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::debug!(attempt, error = %err, "retrying upstream call");
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> UpstreamError {
        UpstreamError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::linear(3, Duration::from_millis(1));
        let result = with_retry(&policy, || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(server_error())
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::linear(2, Duration::from_millis(1));
        let result: Result<(), _> = with_retry(&policy, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(server_error())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::linear(5, Duration::from_millis(1));
        let result: Result<(), _> = with_retry(&policy, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::Status {
                status: 401,
                body: String::new(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::linear(3, Duration::from_millis(200));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(600));
        assert_eq!(
            RetryPolicy::linear(0, Duration::ZERO).delay_for(2),
            Duration::ZERO
        );
    }
}
