//! Error kinds raised while acquiring rates.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the server answered with a non-2xx status.
    #[error("Request failed for {url}: {message}")]
    Network { url: String, message: String },

    /// The response body did not match the expected schema.
    #[error("Failed to parse response from {url}: {message}")]
    Parse { url: String, message: String },

    /// Fetching failed and the cached payload is older than its TTL.
    #[error("Cached rates from {cached_at} have expired")]
    StaleCache {
        cached_at: DateTime<Utc>,
        #[source]
        source: Box<FetchError>,
    },

    /// Fetching failed and nothing usable is cached.
    #[error("No cached rates available")]
    NoCache {
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    pub fn network(url: &str, message: impl ToString) -> Self {
        FetchError::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn parse(url: &str, message: impl ToString) -> Self {
        FetchError::Parse {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Only transport level failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_no_cache_keeps_underlying_error() {
        let err = FetchError::NoCache {
            source: Box::new(FetchError::network("http://rates", "connection refused")),
        };

        assert_eq!(err.to_string(), "No cached rates available");
        assert_eq!(
            err.source().unwrap().to_string(),
            "Request failed for http://rates: connection refused"
        );
    }

    #[test]
    fn test_only_network_errors_are_transient() {
        assert!(FetchError::network("u", "timeout").is_transient());
        assert!(!FetchError::parse("u", "missing field").is_transient());
    }
}
