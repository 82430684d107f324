//! Integration tests that exercise the line-item loader against an on-disk
//! fixture file.
//!
//! These complement the unit tests inside csv_loader.rs (which all use
//! inline string literals) by verifying that the full read-from-disk path
//! works end-to-end, through to the totals report.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use quote_cli::app::TotalsReport;
use quote_cli::csv_loader::{self, CsvLoadError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const GST: Decimal = dec!(18);

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_lines.csv")
}

#[test]
fn test_load_fixture_file_succeeds() {
    let rows = csv_loader::load_from_file(&fixture_path(), GST)
        .expect("fixture file should load without error");

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].description, "Laptop (Dell XPS 13)");
}

#[test]
fn test_fixture_grouped_price_and_rate() {
    let rows = csv_loader::load_from_file(&fixture_path(), GST).unwrap();
    let centrifuge = &rows[2];

    assert_eq!(centrifuge.line.unit_price, dec!(32000.00));
    assert_eq!(centrifuge.line.quantity, 2);
    assert_eq!(centrifuge.line.tax_rate, dec!(12));
    assert_eq!(centrifuge.line.amounts().tax, dec!(7680));
}

#[test]
fn test_fixture_unparseable_price_contributes_nothing() {
    let rows = csv_loader::load_from_file(&fixture_path(), GST).unwrap();

    assert_eq!(rows[3].line.unit_price, Decimal::ZERO);
    assert_eq!(rows[3].line.amounts().total, Decimal::ZERO);
}

#[test]
fn test_fixture_totals() {
    let rows = csv_loader::load_from_file(&fixture_path(), GST).unwrap();

    let totals = TotalsReport(&rows).totals();

    // 85000 + 90000 + 64000
    assert_eq!(totals.subtotal, dec!(239000));
    // 15300 + 16200 + 7680
    assert_eq!(totals.tax_total, dec!(39180));
    assert_eq!(totals.grand_total, dec!(278180));
}

#[test]
fn test_fixture_report_uses_indian_grouping() {
    let rows = csv_loader::load_from_file(&fixture_path(), GST).unwrap();

    let text = TotalsReport(&rows).to_string();

    assert!(text.contains("₹2,39,000.00"), "report was:\n{text}");
    assert!(text.contains("₹39,180.00"), "report was:\n{text}");
    assert!(text.contains("₹2,78,180.00"), "report was:\n{text}");
}

#[test]
fn test_load_nonexistent_file_returns_err() {
    let bad_path = Path::new("/this/path/does/not/exist.csv");

    let result = csv_loader::load_from_file(bad_path, GST);

    assert!(matches!(result, Err(CsvLoadError::Io { .. })));
}
