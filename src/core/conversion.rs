//! Conversions between local currency, foreign currencies, the stablecoin and
//! crypto assets.
//!
//! Every function is pure. A conversion that would need an unset (zero) rate
//! or price returns `None` so callers can show "unavailable" rather than a
//! bogus number.

use crate::core::rates::{CryptoAsset, CryptoPriceSet, RateKind, RateSnapshot, Subunit};

pub const CURRENCY_DECIMALS: u32 = 2;
pub const CRYPTO_DECIMALS: u32 = 8;
pub const SUBUNIT_DECIMALS: u32 = 0;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn usable(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

fn usable_amount(amount: f64) -> Option<f64> {
    amount.is_finite().then_some(amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiatDirection {
    /// Foreign amount in, local amount out.
    ToLocal,
    /// Local amount in, foreign amount out.
    FromLocal,
}

pub fn to_local(amount: f64, rate: f64) -> Option<f64> {
    let rate = usable(rate)?;
    Some(round_to(usable_amount(amount)? * rate, CURRENCY_DECIMALS))
}

pub fn from_local(amount: f64, rate: f64) -> Option<f64> {
    let rate = usable(rate)?;
    Some(round_to(usable_amount(amount)? / rate, CURRENCY_DECIMALS))
}

pub fn convert_fiat(
    rates: &RateSnapshot,
    kind: RateKind,
    direction: FiatDirection,
    amount: f64,
) -> Option<f64> {
    let rate = rates.get(kind);
    match direction {
        FiatDirection::ToLocal => to_local(amount, rate),
        FiatDirection::FromLocal => from_local(amount, rate),
    }
}

/// Side by side conversion of one amount through two different rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub first: f64,
    pub second: f64,
    pub average: f64,
    /// `|first - second| / second * 100`, zero when `second` is zero.
    pub percent_difference: f64,
}

fn raw_convert(rate: f64, direction: FiatDirection, amount: f64) -> Option<f64> {
    let rate = usable(rate)?;
    let amount = usable_amount(amount)?;
    Some(match direction {
        FiatDirection::ToLocal => amount * rate,
        FiatDirection::FromLocal => amount / rate,
    })
}

pub fn compare(
    rates: &RateSnapshot,
    first: RateKind,
    second: RateKind,
    direction: FiatDirection,
    amount: f64,
) -> Option<Comparison> {
    let result1 = raw_convert(rates.get(first), direction, amount)?;
    let result2 = raw_convert(rates.get(second), direction, amount)?;

    let average = (result1 + result2) / 2.0;
    let percent_difference = if result2 == 0.0 {
        0.0
    } else {
        ((result1 - result2) / result2 * 100.0).abs()
    };

    Some(Comparison {
        first: round_to(result1, CURRENCY_DECIMALS),
        second: round_to(result2, CURRENCY_DECIMALS),
        average: round_to(average, CURRENCY_DECIMALS),
        percent_difference: round_to(percent_difference, CURRENCY_DECIMALS),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoDirection {
    StablecoinToCrypto,
    CryptoToStablecoin,
    LocalToCrypto,
    CryptoToLocal,
}

impl CryptoDirection {
    /// Only directions that produce an asset amount can be shown in subunits.
    pub fn yields_asset(&self) -> bool {
        matches!(
            self,
            CryptoDirection::StablecoinToCrypto | CryptoDirection::LocalToCrypto
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionUnit {
    Asset(CryptoAsset),
    Subunit(Subunit),
    Stablecoin,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CryptoConversion {
    pub value: f64,
    pub unit: ConversionUnit,
}

fn into_asset_units(asset: CryptoAsset, units: f64, use_subunit: bool) -> CryptoConversion {
    match asset.subunit().filter(|_| use_subunit) {
        Some(subunit) => CryptoConversion {
            value: round_to(units * subunit.per_unit(), SUBUNIT_DECIMALS),
            unit: ConversionUnit::Subunit(subunit),
        },
        None => CryptoConversion {
            value: round_to(units, CRYPTO_DECIMALS),
            unit: ConversionUnit::Asset(asset),
        },
    }
}

/// Converts `amount` for `asset` in `direction`. `use_subunit` is honoured
/// only for BTC and ETH and only when the result is an asset amount.
pub fn convert_crypto(
    rates: &RateSnapshot,
    prices: &CryptoPriceSet,
    asset: CryptoAsset,
    direction: CryptoDirection,
    amount: f64,
    use_subunit: bool,
) -> Option<CryptoConversion> {
    let amount = usable_amount(amount)?;
    let price = usable(prices.get(asset))?;

    let conversion = match direction {
        CryptoDirection::StablecoinToCrypto => {
            into_asset_units(asset, amount / price, use_subunit)
        }
        CryptoDirection::CryptoToStablecoin => CryptoConversion {
            value: round_to(amount * price, CURRENCY_DECIMALS),
            unit: ConversionUnit::Stablecoin,
        },
        CryptoDirection::LocalToCrypto => {
            let stablecoin_rate = usable(rates.stablecoin_bid_local)?;
            let stablecoin = amount / stablecoin_rate;
            into_asset_units(asset, stablecoin / price, use_subunit)
        }
        CryptoDirection::CryptoToLocal => {
            let stablecoin_rate = usable(rates.stablecoin_bid_local)?;
            let stablecoin = amount * price;
            CryptoConversion {
                value: round_to(stablecoin * stablecoin_rate, CURRENCY_DECIMALS),
                unit: ConversionUnit::Local,
            }
        }
    };

    Some(conversion)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rates() -> RateSnapshot {
        RateSnapshot {
            local_per_usd: 36.5,
            local_per_eur: 39.2,
            stablecoin_bid_local: 36.8,
            captured_at: None,
        }
    }

    fn sample_prices() -> CryptoPriceSet {
        let mut prices = CryptoPriceSet::default();
        prices.set(CryptoAsset::Btc, 50000.0);
        prices.set(CryptoAsset::Eth, 2500.0);
        prices.set(CryptoAsset::Sol, 100.0);
        prices
    }

    #[test]
    fn test_fiat_round_trip() {
        for (amount, rate) in [(1.0, 36.5), (250.75, 39.2), (10_000.0, 0.92), (3.33, 1234.5)] {
            let local = to_local(amount, rate).unwrap();
            let back = from_local(local, rate).unwrap();
            assert!(
                (back - amount).abs() <= 0.01,
                "round trip of {amount} at {rate} gave {back}"
            );
        }
    }

    #[test]
    fn test_unset_rate_is_unavailable() {
        let rates = RateSnapshot::default();
        assert_eq!(from_local(100.0, 0.0), None);
        assert_eq!(to_local(100.0, 0.0), None);
        assert_eq!(
            convert_fiat(&rates, RateKind::Eur, FiatDirection::FromLocal, 100.0),
            None
        );
        assert_eq!(
            compare(&rates, RateKind::Usd, RateKind::Stablecoin, FiatDirection::FromLocal, 1.0),
            None
        );
    }

    #[test]
    fn test_convert_fiat_rounds_to_cents() {
        let rates = sample_rates();
        assert_eq!(
            convert_fiat(&rates, RateKind::Usd, FiatDirection::ToLocal, 10.0),
            Some(365.0)
        );
        assert_eq!(
            convert_fiat(&rates, RateKind::Eur, FiatDirection::FromLocal, 100.0),
            Some(2.55)
        );
    }

    #[test]
    fn test_compare_official_and_p2p_rates() {
        let rates = sample_rates();
        let comparison = compare(
            &rates,
            RateKind::Usd,
            RateKind::Stablecoin,
            FiatDirection::FromLocal,
            1000.0,
        )
        .unwrap();

        assert_eq!(comparison.first, 27.40);
        assert_eq!(comparison.second, 27.17);
        assert!((comparison.average - 27.285).abs() < 0.01);
        assert_eq!(comparison.percent_difference, 0.82);
    }

    #[test]
    fn test_compare_zero_denominator_is_zero_difference() {
        let rates = sample_rates();
        let comparison = compare(
            &rates,
            RateKind::Usd,
            RateKind::Eur,
            FiatDirection::FromLocal,
            0.0,
        )
        .unwrap();

        assert_eq!(comparison.second, 0.0);
        assert_eq!(comparison.percent_difference, 0.0);
        assert!(comparison.percent_difference.is_finite());
    }

    #[test]
    fn test_stablecoin_to_satoshis() {
        let conversion = convert_crypto(
            &sample_rates(),
            &sample_prices(),
            CryptoAsset::Btc,
            CryptoDirection::StablecoinToCrypto,
            1.0,
            true,
        )
        .unwrap();

        assert_eq!(conversion.value, 2000.0);
        assert_eq!(conversion.unit, ConversionUnit::Subunit(Subunit::Satoshi));
    }

    #[test]
    fn test_stablecoin_to_crypto_keeps_eight_decimals() {
        let conversion = convert_crypto(
            &sample_rates(),
            &sample_prices(),
            CryptoAsset::Btc,
            CryptoDirection::StablecoinToCrypto,
            1.0,
            false,
        )
        .unwrap();

        assert_eq!(conversion.value, 0.00002);
        assert_eq!(conversion.unit, ConversionUnit::Asset(CryptoAsset::Btc));
    }

    #[test]
    fn test_subunit_ignored_for_other_assets() {
        let conversion = convert_crypto(
            &sample_rates(),
            &sample_prices(),
            CryptoAsset::Sol,
            CryptoDirection::StablecoinToCrypto,
            50.0,
            true,
        )
        .unwrap();

        assert_eq!(conversion.value, 0.5);
        assert_eq!(conversion.unit, ConversionUnit::Asset(CryptoAsset::Sol));
    }

    #[test]
    fn test_local_to_gwei() {
        // 36.8 local buys 1 USDT, which buys 1/2500 ETH = 400_000 gwei
        let conversion = convert_crypto(
            &sample_rates(),
            &sample_prices(),
            CryptoAsset::Eth,
            CryptoDirection::LocalToCrypto,
            36.8,
            true,
        )
        .unwrap();

        assert_eq!(conversion.value, 400_000.0);
        assert_eq!(conversion.unit, ConversionUnit::Subunit(Subunit::Gwei));
    }

    #[test]
    fn test_crypto_to_stablecoin_and_local() {
        let rates = sample_rates();
        let prices = sample_prices();

        let usdt = convert_crypto(
            &rates,
            &prices,
            CryptoAsset::Eth,
            CryptoDirection::CryptoToStablecoin,
            0.5,
            true,
        )
        .unwrap();
        assert_eq!(usdt.value, 1250.0);
        assert_eq!(usdt.unit, ConversionUnit::Stablecoin);

        let local = convert_crypto(
            &rates,
            &prices,
            CryptoAsset::Eth,
            CryptoDirection::CryptoToLocal,
            0.5,
            false,
        )
        .unwrap();
        assert_eq!(local.value, 46000.0);
        assert_eq!(local.unit, ConversionUnit::Local);
    }

    #[test]
    fn test_crypto_unavailable_without_prices_or_rate() {
        let prices = sample_prices();
        assert_eq!(
            convert_crypto(
                &sample_rates(),
                &prices,
                CryptoAsset::Xrp,
                CryptoDirection::CryptoToStablecoin,
                1.0,
                false,
            ),
            None
        );
        assert_eq!(
            convert_crypto(
                &RateSnapshot::default(),
                &prices,
                CryptoAsset::Btc,
                CryptoDirection::LocalToCrypto,
                100.0,
                false,
            ),
            None
        );
        assert_eq!(
            convert_crypto(
                &sample_rates(),
                &prices,
                CryptoAsset::Btc,
                CryptoDirection::StablecoinToCrypto,
                f64::NAN,
                false,
            ),
            None
        );
    }
}
