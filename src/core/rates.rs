//! Rate and price data model shared by the repository and the calculators.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Selects one of the three local-currency rates of a [`RateSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateKind {
    Usd,
    Eur,
    Stablecoin,
}

impl RateKind {
    pub const ALL: [RateKind; 3] = [RateKind::Usd, RateKind::Eur, RateKind::Stablecoin];

    /// Human readable label used in tables and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            RateKind::Usd => "US Dollar",
            RateKind::Eur => "Euro",
            RateKind::Stablecoin => "Stablecoin P2P",
        }
    }
}

impl Display for RateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateKind::Usd => "USD",
                RateKind::Eur => "EUR",
                RateKind::Stablecoin => "USDT",
            }
        )
    }
}

impl FromStr for RateKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usd" => Ok(RateKind::Usd),
            "eur" => Ok(RateKind::Eur),
            "usdt" | "stablecoin" | "p2p" => Ok(RateKind::Stablecoin),
            _ => Err(anyhow::anyhow!("Invalid rate: {}", s)),
        }
    }
}

/// Local currency rates captured at one point in time. Zero means "not yet fetched".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    pub local_per_usd: f64,
    pub local_per_eur: f64,
    pub stablecoin_bid_local: f64,
    pub captured_at: Option<DateTime<Utc>>,
}

impl RateSnapshot {
    pub fn get(&self, kind: RateKind) -> f64 {
        match kind {
            RateKind::Usd => self.local_per_usd,
            RateKind::Eur => self.local_per_eur,
            RateKind::Stablecoin => self.stablecoin_bid_local,
        }
    }

    pub fn is_populated(&self) -> bool {
        RateKind::ALL.iter().all(|kind| self.get(*kind) > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum CryptoAsset {
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "BNB")]
    Bnb,
    #[serde(rename = "XRP")]
    Xrp,
    #[serde(rename = "SOL")]
    Sol,
    #[serde(rename = "PAXG")]
    Paxg,
}

/// Smallest display denomination of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subunit {
    Satoshi,
    Gwei,
}

impl Subunit {
    pub fn per_unit(&self) -> f64 {
        match self {
            Subunit::Satoshi => 100_000_000.0,
            Subunit::Gwei => 1_000_000_000.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Subunit::Satoshi => "Satoshis",
            Subunit::Gwei => "Gwei",
        }
    }
}

impl CryptoAsset {
    pub const ALL: [CryptoAsset; 6] = [
        CryptoAsset::Btc,
        CryptoAsset::Eth,
        CryptoAsset::Bnb,
        CryptoAsset::Xrp,
        CryptoAsset::Sol,
        CryptoAsset::Paxg,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CryptoAsset::Btc => "BTC",
            CryptoAsset::Eth => "ETH",
            CryptoAsset::Bnb => "BNB",
            CryptoAsset::Xrp => "XRP",
            CryptoAsset::Sol => "SOL",
            CryptoAsset::Paxg => "PAXG",
        }
    }

    pub fn subunit(&self) -> Option<Subunit> {
        match self {
            CryptoAsset::Btc => Some(Subunit::Satoshi),
            CryptoAsset::Eth => Some(Subunit::Gwei),
            _ => None,
        }
    }
}

impl Display for CryptoAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CryptoAsset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CryptoAsset::ALL
            .into_iter()
            .find(|asset| asset.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unsupported asset: {}", s))
    }
}

/// Spot prices quoted in the stablecoin. Zero means "not yet fetched".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CryptoPriceSet {
    #[serde(rename = "BTC")]
    pub btc: f64,
    #[serde(rename = "ETH")]
    pub eth: f64,
    #[serde(rename = "BNB")]
    pub bnb: f64,
    #[serde(rename = "XRP")]
    pub xrp: f64,
    #[serde(rename = "SOL")]
    pub sol: f64,
    #[serde(rename = "PAXG")]
    pub paxg: f64,
    #[serde(rename = "capturedAt")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl CryptoPriceSet {
    pub fn get(&self, asset: CryptoAsset) -> f64 {
        match asset {
            CryptoAsset::Btc => self.btc,
            CryptoAsset::Eth => self.eth,
            CryptoAsset::Bnb => self.bnb,
            CryptoAsset::Xrp => self.xrp,
            CryptoAsset::Sol => self.sol,
            CryptoAsset::Paxg => self.paxg,
        }
    }

    pub fn set(&mut self, asset: CryptoAsset, price: f64) {
        let slot = match asset {
            CryptoAsset::Btc => &mut self.btc,
            CryptoAsset::Eth => &mut self.eth,
            CryptoAsset::Bnb => &mut self.bnb,
            CryptoAsset::Xrp => &mut self.xrp,
            CryptoAsset::Sol => &mut self.sol,
            CryptoAsset::Paxg => &mut self.paxg,
        };
        *slot = price;
    }

    pub fn is_populated(&self) -> bool {
        CryptoAsset::ALL.iter().all(|asset| self.get(*asset) > 0.0)
    }
}

/// The single record persisted by the rate cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPayload {
    pub rates: RateSnapshot,
    #[serde(default)]
    pub crypto_prices: CryptoPriceSet,
    /// Epoch milliseconds of the last save. Rates and prices are refreshed
    /// separately, so each carries its own capture time as well.
    pub timestamp: i64,
}

impl CachedPayload {
    fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// When the cached rates were fetched. Records without a capture time
    /// fall back to the save time.
    pub fn rates_captured_at(&self) -> Option<DateTime<Utc>> {
        self.rates.captured_at.or_else(|| self.saved_at())
    }

    pub fn prices_captured_at(&self) -> Option<DateTime<Utc>> {
        self.crypto_prices.captured_at.or_else(|| self.saved_at())
    }
}

/// Everything the dashboard shows, owned by the caller and lent to the repository.
#[derive(Debug, Clone, Default)]
pub struct ApplicationState {
    pub rates: RateSnapshot,
    pub crypto_prices: CryptoPriceSet,
    /// Copy of `rates` taken right before the latest refresh began.
    pub previous_rates: Option<RateSnapshot>,
    pub last_update: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_payload_json_shape() {
        let mut prices = CryptoPriceSet::default();
        prices.set(CryptoAsset::Btc, 50000.0);
        let payload = CachedPayload {
            rates: RateSnapshot {
                local_per_usd: 36.5,
                local_per_eur: 39.2,
                stablecoin_bid_local: 36.8,
                captured_at: None,
            },
            crypto_prices: prices,
            timestamp: 1_700_000_000_000,
        };

        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["rates"]["localPerUsd"], 36.5);
        assert_eq!(json["rates"]["stablecoinBidLocal"], 36.8);
        assert_eq!(json["cryptoPrices"]["BTC"], 50000.0);
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_capture_times_fall_back_to_save_time() {
        let fetched = Utc.timestamp_millis_opt(1_600_000_000_000).unwrap();
        let payload = CachedPayload {
            rates: RateSnapshot {
                captured_at: Some(fetched),
                ..RateSnapshot::default()
            },
            crypto_prices: CryptoPriceSet::default(),
            timestamp: 1_700_000_000_000,
        };

        assert_eq!(payload.rates_captured_at(), Some(fetched));
        assert_eq!(
            payload.prices_captured_at().map(|at| at.timestamp_millis()),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn test_parse_kinds_and_assets() {
        assert_eq!("usdt".parse::<RateKind>().unwrap(), RateKind::Stablecoin);
        assert_eq!("EUR".parse::<RateKind>().unwrap(), RateKind::Eur);
        assert!("gbp".parse::<RateKind>().is_err());

        assert_eq!("paxg".parse::<CryptoAsset>().unwrap(), CryptoAsset::Paxg);
        assert!("DOGE".parse::<CryptoAsset>().is_err());
    }

    #[test]
    fn test_subunits_only_for_btc_and_eth() {
        assert_eq!(CryptoAsset::Btc.subunit(), Some(Subunit::Satoshi));
        assert_eq!(CryptoAsset::Eth.subunit(), Some(Subunit::Gwei));
        for asset in [
            CryptoAsset::Bnb,
            CryptoAsset::Xrp,
            CryptoAsset::Sol,
            CryptoAsset::Paxg,
        ] {
            assert!(asset.subunit().is_none());
        }
    }

    #[test]
    fn test_empty_state_is_unpopulated() {
        let state = ApplicationState::default();
        assert!(!state.rates.is_populated());
        assert!(!state.crypto_prices.is_populated());
        assert!(state.previous_rates.is_none());
    }
}
