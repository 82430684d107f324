//! CSV loader for ad-hoc line items fed to `quote totals`.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter.
//!
//! | Column        | Required | Type    | Notes                                        |
//! |---------------|----------|---------|----------------------------------------------|
//! | `description` | no       | string  | Free text shown in the report                |
//! | `unit_price`  | yes      | decimal | `85000`, `85,000.50` and `₹85,000` all parse |
//! | `quantity`    | yes      | number  | Fractions are truncated                      |
//! | `tax_rate`    | no       | decimal | GST percent; empty cell uses the default     |
//!
//! Cells are read leniently: a price or rate that does not parse, or is
//! negative, becomes `0`; a quantity that does not parse, or is below one,
//! becomes `1`. Every coercion is logged as a warning.
//!
//! ```csv
//! description,unit_price,quantity,tax_rate
//! Laptop,85000,1,18
//! Smartphone,90000,1,18
//! ```
use std::path::{Path, PathBuf};

use quote_core::ProductLineItem;
use quote_core::calculations::common::quantity_from_f64;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::utils::{parse_decimal, parse_decimal_lenient};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    description: String,
    unit_price: String,
    quantity: String,
    #[serde(default)]
    tax_rate: String,
}

/// Errors that can occur while loading line items.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// Structural CSV failure, such as a missing `unit_price` column.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A line item read from CSV, with its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow {
    pub description: String,
    pub line: ProductLineItem,
}

fn convert_row(
    row: CsvRow,
    default_tax_rate: Decimal,
) -> LineRow {
    let tax_rate = if row.tax_rate.trim().is_empty() {
        default_tax_rate
    } else {
        parse_decimal_lenient(&row.tax_rate, "tax_rate")
    };
    // Non-numeric quantities take the NaN path and come out as one.
    let quantity = parse_decimal(&row.quantity)
        .ok()
        .and_then(|q| f64::try_from(q).ok())
        .unwrap_or(f64::NAN);

    let unit_price = parse_decimal_lenient(&row.unit_price, "unit_price");

    LineRow {
        description: row.description,
        line: ProductLineItem {
            quantity: quantity_from_f64(quantity),
            ..ProductLineItem::new(unit_price, 1, tax_rate)
        },
    }
}

/// Parse CSV text and return the line items in file order.
///
/// `default_tax_rate` applies to rows whose `tax_rate` cell is empty or
/// whose file has no `tax_rate` column.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid or a
///   required column is missing.
pub fn load_from_str(
    input: &str,
    default_tax_rate: Decimal,
) -> Result<Vec<LineRow>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .map(|result| Ok(convert_row(result?, default_tax_rate)))
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(
    path: &Path,
    default_tax_rate: Decimal,
) -> Result<Vec<LineRow>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, default_tax_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quote_core::compute_totals;
    use rust_decimal_macros::dec;

    const GST: Decimal = dec!(18);

    fn lines(rows: &[LineRow]) -> Vec<ProductLineItem> {
        rows.iter().map(|r| r.line).collect()
    }

    // -----------------------------------------------------------------------
    // Well-formed input
    // -----------------------------------------------------------------------
    #[test]
    fn test_two_products_total() {
        let csv = "\
description,unit_price,quantity,tax_rate
Laptop,85000,1,18
Smartphone,90000,1,18
";
        let rows = load_from_str(csv, GST).expect("should parse");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Laptop");

        let totals = compute_totals(&lines(&rows));
        assert_eq!(totals.subtotal, dec!(175000));
        assert_eq!(totals.tax_total, dec!(31500));
        assert_eq!(totals.grand_total, dec!(206500));
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let csv = "\
quantity,tax_rate,unit_price,description
2,12,1500.50,Pipette
";
        let rows = load_from_str(csv, GST).expect("column order should not matter");

        assert_eq!(
            rows[0].line,
            ProductLineItem::new(dec!(1500.50), 2, dec!(12))
        );
    }

    #[test]
    fn test_grouped_amounts_parse() {
        let csv = "description,unit_price,quantity,tax_rate\nScope,\"₹1,00,300\",1,18\n";
        let rows = load_from_str(csv, GST).expect("should parse");

        assert_eq!(rows[0].line.unit_price, dec!(100300));
    }

    // -----------------------------------------------------------------------
    // Defaults
    // -----------------------------------------------------------------------
    #[test]
    fn test_empty_tax_rate_uses_default() {
        let csv = "description,unit_price,quantity,tax_rate\nLaptop,85000,1,\n";
        let rows = load_from_str(csv, dec!(28)).expect("should parse");

        assert_eq!(rows[0].line.tax_rate, dec!(28));
    }

    #[test]
    fn test_missing_optional_columns() {
        let csv = "unit_price,quantity\n85000,1\n";
        let rows = load_from_str(csv, GST).expect("should parse");

        assert_eq!(rows[0].description, "");
        assert_eq!(rows[0].line.tax_rate, GST);
    }

    // -----------------------------------------------------------------------
    // Lenient coercion
    // -----------------------------------------------------------------------
    #[test]
    fn test_unparseable_price_becomes_zero() {
        let csv = "description,unit_price,quantity,tax_rate\nFreebie,n/a,3,18\n";
        let rows = load_from_str(csv, GST).expect("should parse");

        assert_eq!(rows[0].line.unit_price, Decimal::ZERO);
        assert_eq!(rows[0].line.amounts().total, Decimal::ZERO);
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let csv = "description,unit_price,quantity,tax_rate\nOdd,-100,-3,-5\n";
        let rows = load_from_str(csv, GST).expect("should parse");

        assert_eq!(
            rows[0].line,
            ProductLineItem {
                unit_price: Decimal::ZERO,
                quantity: 1,
                tax_rate: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_quantity_fraction_truncated_and_garbage_becomes_one() {
        let csv = "\
description,unit_price,quantity,tax_rate
A,100,2.9,18
B,100,many,18
C,100,,18
";
        let rows = load_from_str(csv, GST).expect("should parse");

        assert_eq!(rows[0].line.quantity, 2);
        assert_eq!(rows[1].line.quantity, 1);
        assert_eq!(rows[2].line.quantity, 1);
    }

    // -----------------------------------------------------------------------
    // Structural errors
    // -----------------------------------------------------------------------
    #[test]
    fn test_missing_unit_price_column_is_parse_error() {
        let csv = "description,quantity\nLaptop,1\n";

        match load_from_str(csv, GST) {
            Err(CsvLoadError::Parse(_)) => {}
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let csv = "description,unit_price,quantity,tax_rate\nLaptop,85000\n";

        assert!(matches!(load_from_str(csv, GST), Err(CsvLoadError::Parse(_))));
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let rows = load_from_str("description,unit_price,quantity,tax_rate\n", GST)
            .expect("header-only CSV is valid");

        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_from_file(Path::new("/nonexistent/lines.csv"), GST);

        assert!(matches!(result, Err(CsvLoadError::Io { .. })));
    }
}
