use crate::error::SyncResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry schedule for idempotent mutation calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
        }
    }
}

/// Run `op` until it succeeds, the error is not retryable, or the attempt
/// budget is spent. Delay doubles between attempts up to `max_delay`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, name: &str, mut op: F) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.attempts && e.is_retryable() => {
                warn!(
                    "{} failed on attempt {}/{}, retrying in {:?}: {}",
                    name, attempt, policy.attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn transient() -> Error {
        Error::NotionStatus {
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), "create page", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok("page-1")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "page-1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: SyncResult<()> = with_retry(&fast_policy(), "archive page", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let result: SyncResult<()> = with_retry(&fast_policy(), "update page", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(Error::NotionStatus {
                    status: 400,
                    body: "bad request".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
