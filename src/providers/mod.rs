pub mod binance;
pub mod exchange_rate_api;
pub mod p2p_market;
pub mod util;

pub use binance::BinancePriceProvider;
pub use exchange_rate_api::ExchangeRateApiProvider;
pub use p2p_market::P2pMarketProvider;
pub use util::RetryPolicy;
