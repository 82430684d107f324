use std::sync::LazyLock;

use quote_core::calculations::common::{coerce_quantity, round_half_up};
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Error returned for a malformed `--item` argument.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid item '{0}': expected <product_id> or <product_id>:<quantity>")]
pub struct ItemSpecError(String);

/// A catalog product reference from the command line, e.g. `2:3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpec {
    pub product_id: i64,
    pub quantity: u32,
}

static ITEM_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?::\s*(-?\d+)\s*)?$").expect("item spec pattern is valid")
});

/// Normalizes input for decimal parsing: trims whitespace, drops the rupee
/// sign and removes commas (thousands and lakh separators).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().trim_start_matches('₹').replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma separators in either Western or Indian grouping
/// (`"1,234.56"`, `"1,00,300"`). Empty or whitespace-only input is treated
/// as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| ParseDecimalError {
        input: s.to_string(),
        source: e,
    })
}

/// Like [`parse_decimal`] but never fails: unparseable input becomes zero
/// and is logged.
pub fn parse_decimal_lenient(
    s: &str,
    field: &'static str,
) -> Decimal {
    parse_decimal(s).unwrap_or_else(|e| {
        tracing::warn!(field, input = %s, "unparseable number coerced to zero: {}", e);
        Decimal::ZERO
    })
}

/// Parses an `--item` argument of the form `<product_id>[:<quantity>]`.
/// The quantity defaults to one and is coerced like any other quantity.
pub fn parse_item_spec(s: &str) -> Result<ItemSpec, ItemSpecError> {
    let caps = ITEM_SPEC_RE
        .captures(s)
        .ok_or_else(|| ItemSpecError(s.to_string()))?;

    let product_id = caps[1]
        .parse::<i64>()
        .map_err(|_| ItemSpecError(s.to_string()))?;
    let quantity = match caps.get(2) {
        Some(q) => coerce_quantity(q.as_str().parse::<i64>().unwrap_or(i64::MAX)),
        None => 1,
    };

    Ok(ItemSpec {
        product_id,
        quantity,
    })
}

/// Formats an amount as Indian rupees with lakh/crore digit grouping,
/// rounded half-up to two places: `₹1,00,300.00`.
pub fn format_inr(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}₹{}.{frac_part}", group_indian(int_part))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while head.len() > 2 {
        let (rest, pair) = head.split_at(head.len() - 2);
        groups.push(pair);
        head = rest;
    }
    groups.push(head);
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Formats a GST rate for display, e.g. `18%` or `12.5%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}
