//! Exponential backoff for network calls
//!
//! Every HTTP request a hospital adapter makes goes through
//! [`retry_with_backoff`] via the shared scraper client. Messaging sends are
//! attempted once and report their outcome instead.
//!
//! Only transient failures are retried; a page that parsed wrongly will parse
//! wrongly again.

use crate::config::RetryConfig;
use crate::domain::{QueueWatchError, Result};
use std::future::Future;
use std::time::Duration;

/// Whether an error is worth another attempt
fn is_retryable(error: &QueueWatchError) -> bool {
    match error {
        QueueWatchError::Scrape(e) => e.is_transient(),
        QueueWatchError::Connection(_) => true,
        _ => false,
    }
}

/// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
pub fn backoff_delay(config: &RetryConfig, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay_ms = config.initial_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    let delay_ms = (delay_ms as u64).min(config.max_delay_ms);
    Duration::from_millis(delay_ms)
}

/// Run `operation` until it succeeds, fails permanently, or `max_retries`
/// attempts have been made.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error immediately.
pub async fn retry_with_backoff<F, T, Fut>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_retries = config.max_retries.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt >= max_retries || !is_retryable(&e) {
                    return Err(e);
                }

                let delay = backoff_delay(config, attempt);
                crate::log_retry_attempt!(attempt, max_retries, delay.as_millis() as u64, e);

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScrapeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(8000));
        assert_eq!(backoff_delay(&config, 4), Duration::from_millis(10000));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(&fast_config(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ScrapeError::Timeout("slow".to_string()).into())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast_config(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ScrapeError::HttpStatus {
                    status: 503,
                    url: "https://example.org".to_string(),
                }
                .into())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parse_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast_config(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ScrapeError::Parse("no table".to_string()).into()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
