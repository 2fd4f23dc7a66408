//! Currency conversion abstractions

use crate::core::error::FetchError;
use async_trait::async_trait;

/// A source quoting how many units of `to` one unit of `from` buys.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, FetchError>;
}
