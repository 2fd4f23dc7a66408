use super::dashboard::refresh_rates_with_spinner;
use super::ui::{
    StyleType, format_optional_cell, format_trimmed, header_cell, new_spinner, new_styled_table,
    style_text,
};
use crate::App;
use crate::core::conversion::{
    CRYPTO_DECIMALS, ConversionUnit, CryptoConversion, CryptoDirection, FiatDirection, compare,
    convert_crypto, convert_fiat,
};
use crate::core::rates::{ApplicationState, CryptoAsset, RateKind};
use crate::core::repository::{Markets, RateRepository};
use anyhow::Result;
use comfy_table::Cell;
use tracing::debug;

/// Restores cached data and only goes to the network for what is missing.
async fn ensure_rates(repository: &RateRepository, state: &mut ApplicationState) -> Result<()> {
    repository.restore(state).await;
    if !state.rates.is_populated() {
        debug!("No usable cached rates, refreshing");
        refresh_rates_with_spinner(repository, state).await?;
    }
    Ok(())
}

async fn ensure_crypto_prices(
    repository: &RateRepository,
    state: &mut ApplicationState,
) -> Result<()> {
    if !state.crypto_prices.is_populated() {
        debug!("No usable cached prices, refreshing");
        let pb = new_spinner("Fetching crypto prices...");
        let result = repository.refresh_crypto_prices(state).await;
        pb.finish_and_clear();
        result?;
    }
    Ok(())
}

fn currency_code(kind: RateKind, markets: &Markets) -> &str {
    match kind {
        RateKind::Usd => "USD",
        RateKind::Eur => "EUR",
        RateKind::Stablecoin => markets.stablecoin.as_str(),
    }
}

fn unavailable() {
    println!(
        "{}",
        style_text(
            "Unavailable: the selected rate has not been fetched yet",
            StyleType::Error
        )
    );
}

pub async fn run_convert(
    app: &App,
    rate: RateKind,
    direction: FiatDirection,
    amount: f64,
) -> Result<()> {
    let repository = app.repository(None)?;
    let mut state = ApplicationState::default();
    ensure_rates(&repository, &mut state).await?;

    let markets = repository.markets();
    let (from, to) = match direction {
        FiatDirection::ToLocal => (currency_code(rate, markets), markets.local_currency.as_str()),
        FiatDirection::FromLocal => (markets.local_currency.as_str(), currency_code(rate, markets)),
    };

    match convert_fiat(&state.rates, rate, direction, amount) {
        Some(result) => println!(
            "{amount:.2} {from} = {} {to}",
            style_text(&format!("{result:.2}"), StyleType::Success)
        ),
        None => unavailable(),
    }
    Ok(())
}

pub async fn run_compare(
    app: &App,
    first: RateKind,
    second: RateKind,
    direction: FiatDirection,
    amount: f64,
) -> Result<()> {
    let repository = app.repository(None)?;
    let mut state = ApplicationState::default();
    ensure_rates(&repository, &mut state).await?;

    let Some(comparison) = compare(&state.rates, first, second, direction, amount) else {
        unavailable();
        return Ok(());
    };

    let markets = repository.markets();
    let unit = |kind: RateKind| match direction {
        FiatDirection::ToLocal => markets.local_currency.clone(),
        FiatDirection::FromLocal => currency_code(kind, markets).to_string(),
    };

    println!(
        "\n{}",
        style_text(&format!("Comparing {amount:.2}"), StyleType::Title)
    );
    let mut table = new_styled_table();
    table.set_header(vec![header_cell("Rate"), header_cell("Result")]);
    table.add_row(vec![
        Cell::new(first.label()),
        format_optional_cell(Some(comparison.first), |v| format!("{v:.2} {}", unit(first))),
    ]);
    table.add_row(vec![
        Cell::new(second.label()),
        format_optional_cell(Some(comparison.second), |v| {
            format!("{v:.2} {}", unit(second))
        }),
    ]);
    table.add_row(vec![
        Cell::new("Average"),
        format_optional_cell(Some(comparison.average), |v| format!("{v:.2}")),
    ]);
    table.add_row(vec![
        Cell::new("Difference"),
        format_optional_cell(Some(comparison.percent_difference), |v| format!("{v:.2}%")),
    ]);
    println!("{table}");
    Ok(())
}

pub fn format_conversion(conversion: &CryptoConversion, markets: &Markets) -> String {
    match conversion.unit {
        ConversionUnit::Asset(asset) => format!(
            "{} {asset}",
            format_trimmed(conversion.value, CRYPTO_DECIMALS as usize)
        ),
        ConversionUnit::Subunit(subunit) => format!("{:.0} {}", conversion.value, subunit.name()),
        ConversionUnit::Stablecoin => format!("{:.2} {}", conversion.value, markets.stablecoin),
        ConversionUnit::Local => format!("{:.2} {}", conversion.value, markets.local_currency),
    }
}

pub async fn run_crypto_convert(
    app: &App,
    asset: CryptoAsset,
    direction: CryptoDirection,
    amount: f64,
    subunit: bool,
) -> Result<()> {
    let repository = app.repository(None)?;
    let mut state = ApplicationState::default();
    match direction {
        CryptoDirection::LocalToCrypto | CryptoDirection::CryptoToLocal => {
            ensure_rates(&repository, &mut state).await?
        }
        _ => {
            repository.restore(&mut state).await;
        }
    }
    ensure_crypto_prices(&repository, &mut state).await?;

    if subunit && (asset.subunit().is_none() || !direction.yields_asset()) {
        println!(
            "{}",
            style_text(
                "Subunits only apply to BTC and ETH amounts, ignoring",
                StyleType::Subtle
            )
        );
    }

    let markets = repository.markets();
    match convert_crypto(
        &state.rates,
        &state.crypto_prices,
        asset,
        direction,
        amount,
        subunit,
    ) {
        Some(conversion) => println!(
            "{}",
            style_text(&format_conversion(&conversion, markets), StyleType::Success)
        ),
        None => unavailable(),
    }
    Ok(())
}
