pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::cache::RateCache;
use crate::core::config::AppConfig;
use crate::core::conversion::{CryptoDirection, FiatDirection};
use crate::core::notify::Notifier;
use crate::core::rates::{CryptoAsset, RateKind};
use crate::core::repository::RateRepository;
use crate::providers::{BinancePriceProvider, ExchangeRateApiProvider, P2pMarketProvider};
use crate::store::KeyValueStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RATES_COLLECTION: &str = "rates";
pub const SETTINGS_COLLECTION: &str = "settings";

#[derive(Debug, Clone, Copy)]
pub enum AppCommand {
    Rates,
    Crypto,
    Convert {
        rate: RateKind,
        direction: FiatDirection,
        amount: f64,
    },
    Compare {
        first: RateKind,
        second: RateKind,
        direction: FiatDirection,
        amount: f64,
    },
    CryptoConvert {
        asset: CryptoAsset,
        direction: CryptoDirection,
        amount: f64,
        subunit: bool,
    },
    Watch,
}

/// Wires configuration, storage and rate sources together.
pub struct App {
    pub config: AppConfig,
    pub store: Arc<KeyValueStore>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let store = match config.default_data_path() {
            Ok(path) => KeyValueStore::open(&path),
            Err(e) => {
                warn!(error = %e, "No data directory, cache will not persist");
                KeyValueStore::in_memory()
            }
        };
        Self {
            config,
            store: Arc::new(store),
        }
    }

    pub fn repository(&self, notifier: Option<Arc<dyn Notifier>>) -> Result<RateRepository> {
        let retry = self.config.retry_policy();
        let providers = &self.config.providers;

        let fiat = ExchangeRateApiProvider::new(&providers.exchange_rate.base_url, retry)?;
        let p2p = P2pMarketProvider::new(&providers.p2p.base_url, retry)?;
        let prices = BinancePriceProvider::new(&providers.binance.base_url, retry)?;
        let cache = RateCache::new(self.store.collection(RATES_COLLECTION));

        let repository = RateRepository::new(
            Arc::new(fiat),
            Arc::new(p2p),
            Arc::new(prices),
            cache,
            self.config.markets(),
        );
        Ok(match notifier {
            Some(notifier) => repository.with_notifier(notifier),
            None => repository,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rate watch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::new(config);

    match command {
        AppCommand::Rates => cli::dashboard::run_rates(&app).await,
        AppCommand::Crypto => cli::dashboard::run_crypto(&app).await,
        AppCommand::Convert {
            rate,
            direction,
            amount,
        } => cli::calculator::run_convert(&app, rate, direction, amount).await,
        AppCommand::Compare {
            first,
            second,
            direction,
            amount,
        } => cli::calculator::run_compare(&app, first, second, direction, amount).await,
        AppCommand::CryptoConvert {
            asset,
            direction,
            amount,
            subunit,
        } => cli::calculator::run_crypto_convert(&app, asset, direction, amount, subunit).await,
        AppCommand::Watch => cli::watch::run(&app).await,
    }
}
