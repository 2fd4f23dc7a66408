use super::util::{RetryPolicy, build_client, get_json, validate_rate, with_retry};
use crate::core::error::FetchError;
use crate::core::price::PriceProvider;
use crate::core::rates::CryptoAsset;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Spot prices from the Binance public ticker endpoint.
pub struct BinancePriceProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl BinancePriceProvider {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client()?,
            retry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    symbol: String,
    price: String,
}

#[async_trait]
impl PriceProvider for BinancePriceProvider {
    #[instrument(name = "CryptoPriceFetch", skip(self), fields(asset = %asset))]
    async fn fetch_price(&self, asset: CryptoAsset, quote: &str) -> Result<f64, FetchError> {
        let pair = format!("{}{}", asset.symbol(), quote.to_uppercase());
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, pair);

        let ticker: TickerPriceResponse =
            with_retry(|| get_json(&self.client, &url), self.retry).await?;

        if ticker.symbol != pair {
            return Err(FetchError::parse(
                &url,
                format!("expected ticker {pair}, got {}", ticker.symbol),
            ));
        }

        let price: f64 = ticker
            .price
            .trim()
            .parse()
            .map_err(|e| FetchError::parse(&url, format!("invalid price '{}': {e}", ticker.price)))?;

        debug!(price, "Fetched {} price", pair);
        validate_rate(&url, "price", price)
    }
}
