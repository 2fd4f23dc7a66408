use super::util::{RetryPolicy, build_client, get_json, validate_rate, with_retry};
use crate::core::currency::CurrencyRateProvider;
use crate::core::error::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Official fiat rates from an exchangerate-api compatible endpoint.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            retry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "FiatRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, FetchError> {
        let url = format!("{}/v4/latest/{}", self.base_url, from.to_uppercase());

        let data: LatestRatesResponse =
            with_retry(|| get_json(&self.client, &url), self.retry).await?;

        let rate = data
            .rates
            .get(&to.to_uppercase())
            .copied()
            .ok_or_else(|| FetchError::parse(&url, format!("missing rate for {to}")))?;

        debug!(rate, "Fetched {}/{} rate", from, to);
        validate_rate(&url, to, rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NO_RETRY: RetryPolicy = RetryPolicy {
        retries: 0,
        delay_ms: 0,
    };

    async fn create_mock_server(base: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v4/latest/{base}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = create_mock_server(
            "USD",
            200,
            r#"{"base": "USD", "rates": {"USD": 1, "EUR": 0.92, "VES": 36.5}}"#,
        )
        .await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), NO_RETRY).unwrap();

        let rate = provider.get_rate("USD", "VES").await.unwrap();
        assert_eq!(rate, 36.5);
    }

    #[tokio::test]
    async fn test_missing_currency_is_parse_error() {
        let mock_server =
            create_mock_server("EUR", 200, r#"{"rates": {"USD": 1.08}}"#).await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), NO_RETRY).unwrap();

        let result = provider.get_rate("EUR", "VES").await;
        assert!(matches!(result, Err(FetchError::Parse { .. })));
        assert!(result.unwrap_err().to_string().contains("missing rate for VES"));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let mock_server = create_mock_server("USD", 500, "").await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), NO_RETRY).unwrap();

        let result = provider.get_rate("USD", "VES").await;
        assert!(matches!(result, Err(FetchError::Network { .. })));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("HTTP error: 500 Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server("USD", 200, r#"{"result": "error"}"#).await;
        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), NO_RETRY).unwrap();

        let result = provider.get_rate("USD", "VES").await;
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }
}
