//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod delta;
pub mod error;
pub mod log;
pub mod notify;
pub mod price;
pub mod rates;
pub mod repository;
pub mod scheduler;

// Re-export main types for cleaner imports
pub use currency::CurrencyRateProvider;
pub use error::FetchError;
pub use price::PriceProvider;
pub use rates::{ApplicationState, CryptoAsset, CryptoPriceSet, RateKind, RateSnapshot};
pub use repository::{RateRefresh, RateRepository, RefreshStatus};
