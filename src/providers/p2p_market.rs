use super::util::{RetryPolicy, build_client, get_json, validate_rate, with_retry};
use crate::core::currency::CurrencyRateProvider;
use crate::core::error::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Peer-to-peer market quotes from a criptoya compatible endpoint. The rate
/// is the best bid for `from` expressed in `to`.
pub struct P2pMarketProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl P2pMarketProvider {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            retry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct P2pQuoteResponse {
    bid: f64,
}

#[async_trait]
impl CurrencyRateProvider for P2pMarketProvider {
    #[instrument(name = "P2pRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, FetchError> {
        let url = format!(
            "{}/api/binancep2p/{}/{}/1",
            self.base_url,
            from.to_uppercase(),
            to.to_uppercase()
        );

        let quote: P2pQuoteResponse =
            with_retry(|| get_json(&self.client, &url), self.retry).await?;

        debug!(bid = quote.bid, "Fetched {}/{} P2P bid", from, to);
        validate_rate(&url, "bid", quote.bid)
    }
}
