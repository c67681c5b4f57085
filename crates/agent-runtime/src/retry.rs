//! Transport Retry
//!
//! Bounded retry with a fixed backoff for transport-level failures. Only
//! errors that report `is_retryable()` are retried; malformed replies and
//! client errors fail immediately.

use std::future::Future;
use std::time::Duration;

use agent_core::Result;
use tracing::warn;

/// Configuration for retry behavior
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Execute an async operation with retry logic
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    operation = operation_name,
                    attempt,
                    max = policy.max_retries,
                    error = %err,
                    "Retrying after transport error"
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::AgentError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy { max_retries: 3, backoff: Duration::from_secs(1) };

        let result = with_retry(&policy, "test", || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AgentError::Transport("reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausted() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy { max_retries: 2, backoff: Duration::from_millis(10) };

        let result: Result<()> = with_retry(&policy, "test", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::HttpStatus { status: 503, body: "busy".into() })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<()> = with_retry(&RetryPolicy::default(), "test", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::MalformedResponse("no choices".into()))
        })
        .await;

        assert!(matches!(result, Err(AgentError::MalformedResponse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
