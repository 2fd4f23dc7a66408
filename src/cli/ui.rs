use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Success,
    Info,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Success => style(text).green().bold(),
        StyleType::Info => style(text).yellow(),
        StyleType::Error => style(text).red().bold(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Formats a percentage change, `+` prefixed when positive.
pub fn format_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{change:.2}%")
    } else {
        format!("{change:.2}%")
    }
}

/// Creates a cell for displaying percentage change with color coding.
/// A missing baseline renders as a neutral `--`.
pub fn change_cell(change: Option<f64>) -> Cell {
    match change {
        None => Cell::new("--")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        Some(change) => {
            let color = if change > 0.0 {
                Color::Green
            } else if change < 0.0 {
                Color::Red
            } else {
                Color::Reset
            };
            Cell::new(format_change(change))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
    }
}

/// Formats `value` with at most `decimals` fraction digits, dropping trailing zeros.
pub fn format_trimmed(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Creates a spinner shown while sources are being queried.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_change_sign() {
        assert_eq!(format_change(1.234), "+1.23%");
        assert_eq!(format_change(-0.5), "-0.50%");
        assert_eq!(format_change(0.0), "0.00%");
    }

    #[test]
    fn test_format_trimmed() {
        assert_eq!(format_trimmed(0.00002, 8), "0.00002");
        assert_eq!(format_trimmed(2000.0, 0), "2000");
        assert_eq!(format_trimmed(1.5, 8), "1.5");
        assert_eq!(format_trimmed(3.0, 8), "3");
    }
}
