use crate::core::error::FetchError;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry policy shared by all rate sources.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay_ms: 300,
        }
    }
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `policy`: Number of retry attempts (total runs = 1 initial + retries) and
///   milliseconds between them
///
/// # Returns
/// Either the successful result or the error of the last attempt. Errors that
/// are not transient are returned immediately.
pub async fn with_retry<F, Fut, T>(mut operation: F, policy: RetryPolicy) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > policy.retries || !err.is_transient() {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, policy.retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(policy.delay_ms)).await;
            }
        }
    }
}

pub fn build_client() -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(concat!("ratewatch/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(15))
        .build()
        .map_err(|e| FetchError::network("client", e))
}

/// Fetches `url` and decodes the body into `T`, failing closed on any shape mismatch.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, FetchError> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::network(url, e))?;

    if !response.status().is_success() {
        return Err(FetchError::network(
            url,
            format!("HTTP error: {}", response.status()),
        ));
    }

    let text = response
        .text()
        .await
        .map_err(|e| FetchError::network(url, e))?;

    serde_json::from_str(&text).map_err(|e| FetchError::parse(url, e))
}

/// Accepts only finite, strictly positive rates.
pub fn validate_rate(url: &str, field: &str, value: f64) -> Result<f64, FetchError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FetchError::parse(
            url,
            format!("invalid value {value} for {field}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FAST: RetryPolicy = RetryPolicy {
        retries: 2,
        delay_ms: 1,
    };

    #[tokio::test]
    async fn test_retries_network_errors_until_success() {
        let calls = AtomicUsize::new(0);
        let result = with_retry(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::network("u", "reset"))
                } else {
                    Ok(7)
                }
            },
            FAST,
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::network("u", "reset"))
            },
            FAST,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parse_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::parse("u", "bad body"))
            },
            FAST,
        )
        .await;

        assert!(matches!(result, Err(FetchError::Parse { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_validate_rate_rejects_nonsense() {
        assert_eq!(validate_rate("u", "bid", 36.8).unwrap(), 36.8);
        assert!(validate_rate("u", "bid", 0.0).is_err());
        assert!(validate_rate("u", "bid", -1.0).is_err());
        assert!(validate_rate("u", "bid", f64::NAN).is_err());
        assert!(validate_rate("u", "bid", f64::INFINITY).is_err());
    }
}
