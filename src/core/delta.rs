//! Percentage change between two snapshots of the same rate.

use crate::core::rates::{ApplicationState, RateKind};

/// `(current - previous) / previous * 100`, sign preserved. `None` when there
/// is no usable previous value, so callers render a neutral placeholder
/// instead of a misleading 0%.
pub fn percent_change(current: f64, previous: Option<f64>) -> Option<f64> {
    let previous = previous.filter(|p| p.is_finite() && *p != 0.0)?;
    if !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Change of every dashboard rate against the snapshot taken before the last refresh.
pub fn rate_deltas(state: &ApplicationState) -> Vec<(RateKind, Option<f64>)> {
    RateKind::ALL
        .into_iter()
        .map(|kind| {
            let previous = state.previous_rates.map(|snapshot| snapshot.get(kind));
            (kind, percent_change(state.rates.get(kind), previous))
        })
        .collect()
}
