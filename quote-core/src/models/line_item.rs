use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{
    coerce_quantity, decimal_from_f64, non_negative, quantity_from_f64, round_half_up,
};
use crate::calculations::compute_line;

/// One priced line of a quotation: unit price, quantity and GST rate.
///
/// The constructors coerce their inputs, so a `ProductLineItem` built through
/// them always satisfies `unit_price >= 0`, `quantity >= 1`, `tax_rate >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLineItem {
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Percentage, e.g. `18` for 18 % GST.
    pub tax_rate: Decimal,
}

impl ProductLineItem {
    pub fn new(
        unit_price: Decimal,
        quantity: i64,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            unit_price: non_negative(unit_price, "unit_price"),
            quantity: coerce_quantity(quantity),
            tax_rate: non_negative(tax_rate, "tax_rate"),
        }
    }

    /// Builds a line from loosely-typed numbers (form fields, JSON, CSV cells).
    pub fn from_f64(
        unit_price: f64,
        quantity: f64,
        tax_rate: f64,
    ) -> Self {
        Self {
            unit_price: decimal_from_f64(unit_price, "unit_price"),
            quantity: quantity_from_f64(quantity),
            tax_rate: decimal_from_f64(tax_rate, "tax_rate"),
        }
    }

    /// `unit_price * quantity`, before tax, with the same coercion as
    /// [`amounts`](Self::amounts).
    pub fn net_amount(&self) -> Decimal {
        self.amounts().net
    }

    pub fn amounts(&self) -> LineAmounts {
        compute_line(self.unit_price, i64::from(self.quantity), self.tax_rate)
    }
}

/// Net, tax and total of a single line, at full precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineAmounts {
    pub net: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl LineAmounts {
    /// Copy rounded to two decimal places for display.
    pub fn rounded(&self) -> Self {
        Self {
            net: round_half_up(self.net),
            tax: round_half_up(self.tax),
            total: round_half_up(self.total),
        }
    }
}

/// Aggregate amounts of a quotation.
///
/// Always derived from the current line items; nothing stores these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotationTotals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
}

impl QuotationTotals {
    /// Copy rounded to two decimal places for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_half_up(self.subtotal),
            tax_total: round_half_up(self.tax_total),
            grand_total: round_half_up(self.grand_total),
        }
    }
}
