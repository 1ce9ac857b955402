//! French locale rendering for money and dates.
//!
//! Amounts print as `1 234,56 €`: comma decimal separator, non-breaking
//! spaces both as thousands separators and before the currency sign,
//! matching what the store's clients expect on paper.

use chrono::NaiveDate;

/// Non-breaking space used in French number formatting.
pub const NBSP: char = '\u{a0}';

/// Format an amount in euros, French style, always two decimals.
pub fn format_eur(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    let whole = (abs / 100).to_string();
    let frac = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    let digits = whole.as_bytes();
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(NBSP);
        }
        grouped.push(*digit as char);
    }

    format!("{sign}{grouped},{frac:02}{NBSP}€")
}

/// Format a date as dd/mm/yyyy.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format a percentage for display ("10 %", trailing zeros trimmed).
pub fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{}{NBSP}%", percent as i64)
    } else {
        format!("{:.2}{NBSP}%", percent).replacen('.', ",", 1)
    }
}
