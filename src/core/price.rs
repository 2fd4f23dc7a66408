//! Pricing abstractions

use crate::core::error::FetchError;
use crate::core::rates::CryptoAsset;
use async_trait::async_trait;

/// A source of spot prices for crypto assets, quoted in `quote`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price(&self, asset: CryptoAsset, quote: &str) -> Result<f64, FetchError>;
}
