//! Fetches rates and prices from every source, falls back to the cache and
//! keeps the previous snapshot for deltas.

use crate::core::cache::{CacheLookup, RateCache};
use crate::core::currency::CurrencyRateProvider;
use crate::core::error::FetchError;
use crate::core::notify::Notifier;
use crate::core::price::PriceProvider;
use crate::core::rates::{
    ApplicationState, CachedPayload, CryptoAsset, CryptoPriceSet, RateKind, RateSnapshot,
};
use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Currency codes the sources are queried with.
#[derive(Debug, Clone)]
pub struct Markets {
    pub local_currency: String,
    pub stablecoin: String,
}

impl Default for Markets {
    fn default() -> Self {
        Self {
            local_currency: "VES".to_string(),
            stablecoin: "USDT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshStatus {
    /// All sources answered.
    Live,
    /// A source failed and the cached rates were adopted instead.
    Cached { cached_at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateRefresh {
    pub snapshot: RateSnapshot,
    pub status: RefreshStatus,
}

pub struct RateRepository {
    fiat: Arc<dyn CurrencyRateProvider>,
    p2p: Arc<dyn CurrencyRateProvider>,
    prices: Arc<dyn PriceProvider>,
    cache: RateCache,
    markets: Markets,
    notifier: Option<Arc<dyn Notifier>>,
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

impl RateRepository {
    pub fn new(
        fiat: Arc<dyn CurrencyRateProvider>,
        p2p: Arc<dyn CurrencyRateProvider>,
        prices: Arc<dyn PriceProvider>,
        cache: RateCache,
        markets: Markets,
    ) -> Self {
        Self {
            fiat,
            p2p,
            prices,
            cache,
            markets,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn markets(&self) -> &Markets {
        &self.markets
    }

    /// Adopts unexpired cached rates and prices, typically once at startup.
    /// Rates and prices expire by their own capture time, not by when the
    /// payload was last saved. Returns whether anything was restored.
    pub async fn restore(&self, state: &mut ApplicationState) -> bool {
        let Some(payload) = self.cache.load().await else {
            return false;
        };
        let now = Utc::now();

        let mut restored = false;
        if let Some(rates) = self.unexpired_rates(&payload, now) {
            state.rates = rates;
            state.last_update = rates.captured_at;
            restored = true;
        }
        let prices_captured_at = payload.prices_captured_at();
        let prices_fresh =
            prices_captured_at.is_some_and(|at| !self.cache.is_expired(at, now));
        if payload.crypto_prices.is_populated() && prices_fresh {
            state.crypto_prices = CryptoPriceSet {
                captured_at: prices_captured_at,
                ..payload.crypto_prices
            };
            restored = true;
        }
        debug!(restored, "Restored state from cache");
        restored
    }

    /// Cached rates that are complete and younger than the TTL, stamped with
    /// their capture time so later saves cannot make them look newer.
    fn unexpired_rates(
        &self,
        payload: &CachedPayload,
        now: DateTime<Utc>,
    ) -> Option<RateSnapshot> {
        let captured_at = payload.rates_captured_at()?;
        if !payload.rates.is_populated() || self.cache.is_expired(captured_at, now) {
            return None;
        }
        Some(RateSnapshot {
            captured_at: Some(captured_at),
            ..payload.rates
        })
    }

    /// Refreshes the three local currency rates as one unit. Either every
    /// rate is replaced or none is.
    pub async fn refresh_rates(
        &self,
        state: &mut ApplicationState,
    ) -> Result<RateRefresh, FetchError> {
        let earlier_previous = state.previous_rates.replace(state.rates);
        let local = self.markets.local_currency.as_str();

        let (usd, eur, bid) = futures::join!(
            self.fiat.get_rate("USD", local),
            self.fiat.get_rate("EUR", local),
            self.p2p.get_rate(&self.markets.stablecoin, local),
        );

        let now = Utc::now();
        let mut snapshot = RateSnapshot {
            captured_at: Some(now),
            ..RateSnapshot::default()
        };
        let mut failure = None;
        for (kind, result) in [
            (RateKind::Usd, usd),
            (RateKind::Eur, eur),
            (RateKind::Stablecoin, bid),
        ] {
            match result {
                Ok(rate) => match kind {
                    RateKind::Usd => snapshot.local_per_usd = rate,
                    RateKind::Eur => snapshot.local_per_eur = rate,
                    RateKind::Stablecoin => snapshot.stablecoin_bid_local = rate,
                },
                Err(e) => {
                    warn!(rate = %kind, error = %e, "Rate fetch failed");
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return self
                .fall_back_to_cache(state, earlier_previous, e, now)
                .await;
        }

        state.rates = snapshot;
        state.last_update = Some(now);

        self.persist(state, now).await;
        info!(?snapshot, "Rates refreshed");

        if let Some(notifier) = &self.notifier {
            notifier.notify(&self.summary(&snapshot)).await;
        }

        Ok(RateRefresh {
            snapshot,
            status: RefreshStatus::Live,
        })
    }

    async fn fall_back_to_cache(
        &self,
        state: &mut ApplicationState,
        earlier_previous: Option<RateSnapshot>,
        failure: FetchError,
        now: DateTime<Utc>,
    ) -> Result<RateRefresh, FetchError> {
        let error = match self.cache.lookup(now).await {
            CacheLookup::Fresh(payload) | CacheLookup::Expired(payload)
                if payload.rates.is_populated() =>
            {
                if let Some(rates) = self.unexpired_rates(&payload, now) {
                    let cached_at = rates.captured_at.unwrap_or(now);
                    warn!(%cached_at, "Serving cached rates");
                    state.rates = rates;
                    state.last_update = Some(cached_at);
                    return Ok(RateRefresh {
                        snapshot: rates,
                        status: RefreshStatus::Cached { cached_at },
                    });
                }
                FetchError::StaleCache {
                    cached_at: payload.rates_captured_at().unwrap_or_default(),
                    source: Box::new(failure),
                }
            }
            CacheLookup::Expired(payload) => FetchError::StaleCache {
                cached_at: millis_to_datetime(payload.timestamp).unwrap_or_default(),
                source: Box::new(failure),
            },
            CacheLookup::Fresh(_) | CacheLookup::Missing => FetchError::NoCache {
                source: Box::new(failure),
            },
        };

        // Nothing changed, so the earlier delta baseline still applies
        state.previous_rates = earlier_previous;
        warn!(error = %error, "Rate refresh failed");
        Err(error)
    }

    /// Refreshes all six crypto prices as one unit. There is no cache
    /// fallback: on any failure the current prices are kept and the error
    /// is returned.
    pub async fn refresh_crypto_prices(
        &self,
        state: &mut ApplicationState,
    ) -> Result<CryptoPriceSet, FetchError> {
        let quote = self.markets.stablecoin.as_str();
        let futures = CryptoAsset::ALL.into_iter().map(|asset| async move {
            (asset, self.prices.fetch_price(asset, quote).await)
        });
        let results = join_all(futures).await;

        let mut prices = state.crypto_prices;
        let mut failure = None;
        for (asset, result) in results {
            match result {
                Ok(price) => prices.set(asset, price),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "Price fetch failed");
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let now = Utc::now();
        prices.captured_at = Some(now);
        state.crypto_prices = prices;
        self.persist(state, now).await;
        info!(?prices, "Crypto prices refreshed");
        Ok(prices)
    }

    async fn persist(&self, state: &ApplicationState, now: DateTime<Utc>) {
        self.cache
            .save(&CachedPayload {
                rates: state.rates,
                crypto_prices: state.crypto_prices,
                timestamp: now.timestamp_millis(),
            })
            .await;
    }

    /// Multi-line summary used for notifications.
    pub fn summary(&self, snapshot: &RateSnapshot) -> String {
        RateKind::ALL
            .iter()
            .map(|kind| {
                format!(
                    "{}: {:.2} {}",
                    kind.label(),
                    snapshot.get(*kind),
                    self.markets.local_currency
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
