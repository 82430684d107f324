//! GST totals engine for quotations.
//!
//! Every quotation line carries a unit price, a quantity and a GST rate
//! (percentage). The engine derives the tax and total of each line and
//! aggregates them across a quotation:
//!
//! | Value        | Formula                                     |
//! |--------------|---------------------------------------------|
//! | line tax     | unit price × quantity × rate / 100          |
//! | line total   | unit price × quantity + line tax            |
//! | subtotal     | Σ unit price × quantity                     |
//! | tax total    | Σ line tax                                  |
//! | grand total  | subtotal + tax total                        |
//!
//! The functions never fail. Negative amounts and rates are treated as zero
//! and quantities below one as one (see [`super::common`]). Results keep full
//! precision; round with [`QuotationTotals::rounded`] only for display.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use quote_core::{ProductLineItem, compute_totals};
//!
//! let lines = [
//!     ProductLineItem::new(dec!(85000), 1, dec!(18)),
//!     ProductLineItem::new(dec!(90000), 1, dec!(18)),
//! ];
//!
//! let totals = compute_totals(&lines);
//!
//! assert_eq!(totals.subtotal, dec!(175000));
//! assert_eq!(totals.tax_total, dec!(31500));
//! assert_eq!(totals.grand_total, dec!(206500));
//! ```

use rust_decimal::Decimal;

use crate::calculations::common::{coerce_quantity, non_negative};
use crate::models::{LineAmounts, ProductLineItem, QuotationTotals};

const PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Computes the tax and total of one line.
///
/// ```
/// use rust_decimal_macros::dec;
/// use quote_core::compute_line;
///
/// let amounts = compute_line(dec!(85000), 1, dec!(18));
///
/// assert_eq!(amounts.tax, dec!(15300));
/// assert_eq!(amounts.total, dec!(100300));
/// ```
pub fn compute_line(
    unit_price: Decimal,
    quantity: i64,
    tax_rate: Decimal,
) -> LineAmounts {
    let unit_price = non_negative(unit_price, "unit_price");
    let quantity = Decimal::from(coerce_quantity(quantity));
    let tax_rate = non_negative(tax_rate, "tax_rate");

    let net = unit_price.saturating_mul(quantity);
    let tax = net.saturating_mul(tax_rate) / PERCENT;

    LineAmounts {
        net,
        tax,
        total: net.saturating_add(tax),
    }
}

/// Aggregates subtotal, tax total and grand total over `line_items`.
///
/// An empty slice yields all-zero totals. Every line goes through
/// [`compute_line`], so the subtotal and the tax total are built from the
/// same coerced values even when a line's fields were set directly.
pub fn compute_totals(line_items: &[ProductLineItem]) -> QuotationTotals {
    let (subtotal, tax_total) = line_items.iter().map(ProductLineItem::amounts).fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(subtotal, tax_total), amounts| {
            (
                subtotal.saturating_add(amounts.net),
                tax_total.saturating_add(amounts.tax),
            )
        },
    );

    QuotationTotals {
        subtotal,
        tax_total,
        grand_total: subtotal.saturating_add(tax_total),
    }
}
