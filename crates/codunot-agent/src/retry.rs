// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeout and retry around calls to external services.

use std::future::Future;
use std::time::Duration;

use codunot_config::AgentConfig;
use codunot_core::CodunotError;
use tracing::warn;

/// How often and how long to try an external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay before the first retry; doubled for each later one.
    pub base_delay: Duration,
    /// Limit for each individual attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            retries: config.generation_retries,
            base_delay: Duration::from_millis(config.retry_backoff_ms),
            timeout: Duration::from_secs(config.generation_timeout_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

/// Whether a failed attempt is worth repeating.
fn is_transient(err: &CodunotError) -> bool {
    matches!(
        err,
        CodunotError::Provider { .. } | CodunotError::Timeout { .. } | CodunotError::Channel { .. }
    )
}

/// Run `op` with a per-attempt timeout, retrying transient failures with
/// exponential backoff. Returns the last error when attempts run out.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, CodunotError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CodunotError>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(CodunotError::Timeout {
                duration: policy.timeout,
            }),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if attempt <= policy.retries && is_transient(&e) => {
                warn!(
                    what,
                    attempt,
                    retries = policy.retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            base_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    fn provider_error() -> CodunotError {
        CodunotError::Provider {
            message: "503".to_string(),
            source: None,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry(&fast(2), "test", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(provider_error())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = with_retry(&fast(1), "test", || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err(provider_error()) }
        })
        .await;
        assert!(matches!(result, Err(CodunotError::Provider { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = with_retry(&fast(3), "test", || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err(CodunotError::Internal("bug".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempt_times_out() {
        let policy = RetryPolicy {
            retries: 0,
            base_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(1),
        };
        let result: Result<(), _> = with_retry(&policy, "test", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(CodunotError::Timeout { .. })));
    }
}
