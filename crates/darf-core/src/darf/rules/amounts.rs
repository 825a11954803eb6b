//! Brazilian currency amounts (1.386,00).

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT, AMOUNT_FULL};

/// Parse a Brazilian formatted amount into a decimal.
pub fn parse_br_amount(amount: &str) -> Option<Decimal> {
    let amount = amount.trim();
    if !AMOUNT_FULL.is_match(amount) {
        return None;
    }
    let normalized = amount.replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Whether the string is a well-formed Brazilian currency amount.
pub fn validate_br_amount(amount: &str) -> bool {
    parse_br_amount(amount).is_some()
}

/// First syntactically and semantically valid amount in the text.
pub fn first_amount(text: &str) -> Option<&str> {
    AMOUNT
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|a| validate_br_amount(a))
}

/// Format a decimal back into Brazilian notation with two decimals.
pub fn format_br_amount(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();
    let (int_part, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let dec_part = format!("{:0<2}", frac);

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{}{},{}", if negative { "-" } else { "" }, grouped, dec_part)
}
