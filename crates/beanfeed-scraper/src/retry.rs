//! Exponential backoff retry for transient fetch failures.
//!
//! Which errors count as transient is decided by
//! [`ScraperError::is_retriable`]. Everything else is propagated on the first
//! failure without sleeping.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Runs `operation`, retrying transient failures with exponential backoff.
///
/// The wait before retry `n` (1-based) is `backoff_base_ms * 2^(n-1)`, so a
/// base of 1000 sleeps 1 s, then 2 s, then 4 s. At most `max_retries + 1`
/// attempts are made; the last error is returned when they run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_retriable() || attempt >= max_retries {
            return Err(err);
        }

        // Cap the shift so extreme configs saturate instead of overflowing.
        let delay_ms = backoff_base_ms.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const URL: &str = "https://roaster.example/collections/coffee/products.json";

    fn status(status: u16) -> ScraperError {
        ScraperError::UnexpectedStatus {
            status,
            url: URL.to_owned(),
        }
    }

    /// Plays back `script` one outcome per attempt (`Ok(7)` once it runs dry)
    /// and returns the final result with the number of attempts made.
    async fn replay(
        max_retries: u32,
        script: Vec<Result<u32, ScraperError>>,
    ) -> (Result<u32, ScraperError>, usize) {
        let state = Mutex::new((VecDeque::from(script), 0usize));
        let result = retry_with_backoff(max_retries, 0, || {
            let mut state = state.lock().unwrap();
            state.1 += 1;
            let next = state.0.pop_front().unwrap_or(Ok(7));
            async move { next }
        })
        .await;
        (result, state.into_inner().unwrap().1)
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retry() {
        let (result, attempts) = replay(3, vec![Ok(42)]).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let (result, attempts) = replay(3, vec![Err(status(503)), Err(status(502))]).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn timeouts_are_retried() {
        let timeout = || ScraperError::Timeout {
            url: URL.to_owned(),
            timeout_ms: 10,
        };
        let (result, attempts) = replay(1, vec![Err(timeout()), Err(timeout())]).await;
        assert_eq!(attempts, 2);
        assert!(matches!(result, Err(ScraperError::Timeout { .. })));
    }

    #[tokio::test]
    async fn last_error_is_returned_once_budget_is_spent() {
        let script = (0..5).map(|_| Err(status(500))).collect();
        let (result, attempts) = replay(2, script).await;
        assert_eq!(attempts, 3);
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn permanent_errors_fail_on_first_attempt() {
        let not_json = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let permanent = vec![
            status(400),
            status(429),
            ScraperError::NotFound {
                url: URL.to_owned(),
            },
            ScraperError::Deserialize {
                context: URL.to_owned(),
                source: not_json,
            },
        ];

        for err in permanent {
            let label = err.to_string();
            let (result, attempts) = replay(3, vec![Err(err)]).await;
            assert_eq!(attempts, 1, "{label} should not be retried");
            assert!(result.is_err());
        }
    }
}
