//! Common utility functions for quotation calculations.
//!
//! This module provides the currency rounding used for display and the
//! coercion rules applied to every numeric input of the totals engine.
//! Inputs are never rejected: negative or non-finite amounts become zero
//! and quantities below one become one.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::warn;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero). Only used for display; the
/// engine keeps full precision internally.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use quote_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a monetary amount or percentage to zero when negative.
///
/// `field` only names the value in the warning that is logged on coercion.
pub fn non_negative(
    value: Decimal,
    field: &'static str,
) -> Decimal {
    if value < Decimal::ZERO {
        warn!(field, value = %value, "negative value coerced to zero");
        Decimal::ZERO
    } else {
        value
    }
}

/// Coerces a signed quantity to the engine's `quantity >= 1` domain.
///
/// Values below one become one; values above `u32::MAX` saturate.
pub fn coerce_quantity(quantity: i64) -> u32 {
    if quantity < 1 {
        warn!(quantity, "quantity below one coerced to one");
        return 1;
    }
    u32::try_from(quantity).unwrap_or(u32::MAX)
}

/// Converts a floating-point amount into a [`Decimal`].
///
/// NaN, infinities and values outside the `Decimal` range become zero, then
/// [`non_negative`] applies.
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use quote_core::calculations::common::decimal_from_f64;
///
/// assert_eq!(decimal_from_f64(85000.0, "unit_price"), dec!(85000));
/// assert_eq!(decimal_from_f64(f64::NAN, "unit_price"), Decimal::ZERO);
/// assert_eq!(decimal_from_f64(-3.5, "unit_price"), Decimal::ZERO);
/// ```
pub fn decimal_from_f64(
    value: f64,
    field: &'static str,
) -> Decimal {
    match Decimal::from_f64(value) {
        Some(d) => non_negative(d, field),
        None => {
            warn!(field, value, "non-finite value coerced to zero");
            Decimal::ZERO
        }
    }
}

/// Converts a floating-point quantity, truncating any fraction.
///
/// NaN and infinities become one, as does anything below one.
pub fn quantity_from_f64(quantity: f64) -> u32 {
    if !quantity.is_finite() {
        warn!(quantity, "non-finite quantity coerced to one");
        return 1;
    }
    let truncated = quantity.trunc();
    if truncated >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    // `as` saturates, and the range is already checked above
    coerce_quantity(truncated as i64)
}
