use super::ui::{
    StyleType, change_cell, format_optional_cell, header_cell, new_spinner, new_styled_table,
    style_text,
};
use crate::App;
use crate::core::conversion::{CryptoDirection, convert_crypto};
use crate::core::delta::rate_deltas;
use crate::core::rates::{ApplicationState, CryptoAsset, RateKind};
use crate::core::repository::{Markets, RateRefresh, RateRepository, RefreshStatus};
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

/// Refreshes the local currency rates and prints the dashboard.
pub async fn run_rates(app: &App) -> Result<()> {
    let repository = app.repository(None)?;
    let mut state = ApplicationState::default();
    repository.restore(&mut state).await;

    let outcome = refresh_rates_with_spinner(&repository, &mut state).await;
    print_rates(&state, repository.markets());
    outcome.map(|_| ())
}

/// Refreshes crypto prices and prints them in the stablecoin and local currency.
pub async fn run_crypto(app: &App) -> Result<()> {
    let repository = app.repository(None)?;
    let mut state = ApplicationState::default();
    repository.restore(&mut state).await;

    let pb = new_spinner("Fetching crypto prices...");
    let result = repository.refresh_crypto_prices(&mut state).await;
    pb.finish_and_clear();

    match &result {
        Ok(_) => println!(
            "{}",
            style_text("Crypto prices updated", StyleType::Success)
        ),
        Err(e) => println!(
            "{} {}",
            style_text("Could not load crypto prices:", StyleType::Error),
            e
        ),
    }
    print_crypto(&state, repository.markets());
    result.map(|_| ()).map_err(Into::into)
}

pub(crate) async fn refresh_rates_with_spinner(
    repository: &RateRepository,
    state: &mut ApplicationState,
) -> Result<RateRefresh> {
    let pb = new_spinner("Fetching exchange rates...");
    let result = repository.refresh_rates(state).await;
    pb.finish_and_clear();

    match &result {
        Ok(refresh) => print_refresh_status(refresh),
        Err(e) => println!(
            "{} {}",
            style_text("Could not load rates:", StyleType::Error),
            e
        ),
    }
    result.map_err(Into::into)
}

pub fn print_refresh_status(refresh: &RateRefresh) {
    match refresh.status {
        RefreshStatus::Live => {
            println!("{}", style_text("Rates updated", StyleType::Success))
        }
        RefreshStatus::Cached { cached_at } => println!(
            "{}",
            style_text(
                &format!(
                    "Offline: showing cached rates from {}",
                    cached_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                ),
                StyleType::Info
            )
        ),
    }
}

pub fn print_rates(state: &ApplicationState, markets: &Markets) {
    println!(
        "\n{}",
        style_text(
            &format!("Exchange rates ({})", markets.local_currency),
            StyleType::Title
        )
    );

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Rate"),
        header_cell(&format!("Value ({})", markets.local_currency)),
        header_cell("Change"),
    ]);

    for (kind, delta) in rate_deltas(state) {
        let value = state.rates.get(kind);
        let name = match kind {
            RateKind::Stablecoin => format!("{} ({})", kind.label(), markets.stablecoin),
            _ => format!("{} ({kind})", kind.label()),
        };
        table.add_row(vec![
            Cell::new(name),
            format_optional_cell((value > 0.0).then_some(value), |v| format!("{v:.2}")),
            change_cell(delta),
        ]);
    }
    println!("{table}");

    match state.last_update {
        Some(at) => println!(
            "{}",
            style_text(
                &format!(
                    "Updated: {}",
                    at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                ),
                StyleType::Subtle
            )
        ),
        None => println!("{}", style_text("No data available", StyleType::Subtle)),
    }
}

pub fn print_crypto(state: &ApplicationState, markets: &Markets) {
    println!("\n{}", style_text("Crypto prices", StyleType::Title));

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Asset"),
        header_cell(&format!("Price ({})", markets.stablecoin)),
        header_cell(&format!("Price ({})", markets.local_currency)),
    ]);

    for asset in CryptoAsset::ALL {
        let price = state.crypto_prices.get(asset);
        let local = convert_crypto(
            &state.rates,
            &state.crypto_prices,
            asset,
            CryptoDirection::CryptoToLocal,
            1.0,
            false,
        );
        table.add_row(vec![
            Cell::new(asset.symbol()),
            format_optional_cell((price > 0.0).then_some(price), |v| format!("{v:.2}")),
            format_optional_cell(local.map(|c| c.value), |v| format!("{v:.2}")),
        ]);
    }
    println!("{table}");
}
