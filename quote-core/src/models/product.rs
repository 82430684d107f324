use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::compute_line;

/// GST rate applied to catalog products unless one is given explicitly.
pub const DEFAULT_GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub make: String,
    pub model: String,
    pub specification: String,
    pub hsn_code: String,
    pub price: Decimal,
    pub gst_rate: Decimal,
}

impl Product {
    /// GST on a single unit.
    pub fn gst_amount(&self) -> Decimal {
        compute_line(self.price, 1, self.gst_rate).tax
    }

    /// Price of a single unit including GST.
    pub fn total_price(&self) -> Decimal {
        compute_line(self.price, 1, self.gst_rate).total
    }
}

/// For creating new products (no id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub make: String,
    pub model: String,
    pub specification: String,
    pub hsn_code: String,
    pub price: Decimal,
    pub gst_rate: Decimal,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn laptop() -> Product {
        Product {
            id: 1,
            name: "Laptop".to_string(),
            make: "Dell".to_string(),
            model: "XPS 13".to_string(),
            specification: "i7, 16GB RAM, 512GB SSD".to_string(),
            hsn_code: "8471300".to_string(),
            price: dec!(85000),
            gst_rate: DEFAULT_GST_RATE,
        }
    }

    #[test]
    fn default_gst_rate_is_eighteen_percent() {
        assert_eq!(DEFAULT_GST_RATE, dec!(18));
    }

    #[test]
    fn derived_prices_use_gst_rate() {
        let product = laptop();

        assert_eq!(product.gst_amount(), dec!(15300));
        assert_eq!(product.total_price(), dec!(100300));
    }

    #[test]
    fn derived_prices_follow_price_changes() {
        let product = Product {
            price: dec!(90000),
            ..laptop()
        };

        assert_eq!(product.gst_amount(), dec!(16200));
        assert_eq!(product.total_price(), dec!(106200));
    }
}
