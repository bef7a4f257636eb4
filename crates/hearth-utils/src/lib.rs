//! Formatting helpers for amounts, dates and terminal output

use chrono::NaiveDate;
use hearth_config::{CurrencyConfig, SymbolPosition};
use rust_decimal::{Decimal, RoundingStrategy};

/// Insert `separator` between groups of three digits
pub fn group_thousands(digits: &str, separator: &str) -> String {
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format an amount with the configured symbol and separators
///
/// `1234.5` becomes `R$ 1.234,50` with the default settings.
pub fn format_amount(amount: Decimal, currency: &CurrencyConfig) -> String {
    let rounded = amount
        .round_dp_with_strategy(currency.decimal_places, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    let text = format!("{:.*}", currency.decimal_places as usize, rounded);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };

    let mut number = group_thousands(int_part, &currency.thousands_separator);
    if let Some(frac) = frac_part {
        number.push_str(&currency.decimal_separator);
        number.push_str(frac);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match currency.symbol_position {
        SymbolPosition::Before => format!("{}{} {}", sign, currency.symbol, number),
        SymbolPosition::After => format!("{}{} {}", sign, number, currency.symbol),
    }
}

/// `YYYY-MM-DD...` as `DD/MM/YYYY`; anything else is returned unchanged
pub fn display_date(value: &str) -> String {
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Shorten `text` to at most `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Text progress bar for a percentage in `0..=100`
pub fn progress_bar(progress: f64, width: usize) -> String {
    let clamped = if progress.is_finite() { progress.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        " ".repeat(width - filled.min(width)),
        clamped
    )
}
