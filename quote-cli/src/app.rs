//! Command handlers and report rendering for the `quote` binary.

use std::fmt;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use quote_core::db::RepositoryRegistry;
use quote_core::{
    Client, LineAmounts, Product, ProductLineItem, Quotation, QuotationDraft, QuotationRepository,
    QuotationTotals, ReferenceId, RepositoryError, compute_totals,
};
use quote_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::QuotationConfig;
use crate::csv_loader::LineRow;
use crate::records::TermsPatch;
use crate::utils::{ItemSpec, format_inr, format_rate};

/// Registry with every backend this binary was built with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

// ─── create ──────────────────────────────────────────────────────────────────

/// What `quote create` was asked to build.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub client_id: i64,
    pub items: Vec<ItemSpec>,
    /// Replaces the catalog GST rate on every line when set.
    pub tax_rate: Option<Decimal>,
    /// Overrides for the configured terms.
    pub terms: TermsPatch,
}

/// Build a draft from catalog products, give it the next reference id for
/// `today`'s year and store it.
pub async fn create_quotation(
    repo: &dyn QuotationRepository,
    request: &CreateRequest,
    settings: &QuotationConfig,
    today: NaiveDate,
) -> Result<Quotation> {
    let client = repo
        .get_client(request.client_id)
        .await
        .with_context(|| format!("client {} not found", request.client_id))?;

    let mut draft = QuotationDraft::with_terms(settings.terms.clone());
    request.terms.apply(draft.terms_mut());
    draft.select_client(&client);

    for spec in &request.items {
        let product = repo
            .get_product(spec.product_id)
            .await
            .with_context(|| format!("product {} not found", spec.product_id))?;
        let index = draft.add_product(&product, i64::from(spec.quantity));
        if let Some(rate) = request.tax_rate {
            draft.set_tax_rate(index, rate)?;
        }
    }

    let existing = repo.count_quotations().await?;
    let taken = repo.list_reference_ids().await?;
    let reference_id = ReferenceId::next_unused(today.year(), existing, &taken);
    debug!(%reference_id, lines = draft.lines().len(), "finalizing draft");

    let new_quotation = draft.finalize(reference_id, today, settings.validity_days)?;
    let quotation = repo
        .create_quotation(new_quotation)
        .await
        .context("failed to save quotation")?;

    info!(
        id = quotation.id,
        reference_id = %quotation.reference_id,
        grand_total = %quotation.totals().rounded().grand_total,
        "quotation created"
    );
    Ok(quotation)
}

/// Fetch a quotation, turning a missing id into a readable error.
pub async fn find_quotation(
    repo: &dyn QuotationRepository,
    id: i64,
) -> Result<Quotation> {
    match repo.get_quotation(id).await {
        Err(RepositoryError::NotFound) => anyhow::bail!("quotation {id} not found"),
        other => Ok(other?),
    }
}

// ─── JSON ────────────────────────────────────────────────────────────────────

/// A quotation together with its derived amounts, as rendered by
/// `show --json`.
///
/// Derived amounts (`line_amounts` and `totals`) are rounded to two decimal
/// places. Stored inputs (`unit_price`, `tax_rate`) keep full precision.
#[derive(Debug, Serialize)]
pub struct QuotationDocument<'a> {
    #[serde(flatten)]
    pub quotation: &'a Quotation,
    pub line_amounts: Vec<LineAmounts>,
    pub totals: QuotationTotals,
}

impl<'a> QuotationDocument<'a> {
    pub fn new(quotation: &'a Quotation) -> Self {
        Self {
            quotation,
            line_amounts: quotation
                .items
                .iter()
                .map(|i| i.line.amounts().rounded())
                .collect(),
            totals: quotation.totals().rounded(),
        }
    }
}

pub fn quotation_json(quotation: &Quotation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&QuotationDocument::new(quotation))
}

// ─── text reports ────────────────────────────────────────────────────────────

fn write_totals(
    f: &mut fmt::Formatter<'_>,
    totals: &QuotationTotals,
) -> fmt::Result {
    let totals = totals.rounded();
    writeln!(f, "{:>60} {:>18}", "Subtotal:", format_inr(totals.subtotal))?;
    writeln!(f, "{:>60} {:>18}", "GST:", format_inr(totals.tax_total))?;
    writeln!(f, "{:>60} {:>18}", "Grand total:", format_inr(totals.grand_total))
}

fn write_line(
    f: &mut fmt::Formatter<'_>,
    number: usize,
    label: &str,
    line: &ProductLineItem,
) -> fmt::Result {
    let amounts = line.amounts();
    writeln!(
        f,
        "{:>3}  {:<30} {:>5} {:>16} {:>6} {:>16} {:>18}",
        number,
        label,
        line.quantity,
        format_inr(line.unit_price),
        format_rate(line.tax_rate),
        format_inr(amounts.tax),
        format_inr(amounts.total),
    )
}

fn write_line_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
        f,
        "{:>3}  {:<30} {:>5} {:>16} {:>6} {:>16} {:>18}",
        "#", "Item", "Qty", "Unit price", "GST", "Tax", "Total"
    )
}

/// Line-by-line breakdown of an ad-hoc CSV.
pub struct TotalsReport<'a>(pub &'a [LineRow]);

impl TotalsReport<'_> {
    pub fn totals(&self) -> QuotationTotals {
        let lines: Vec<_> = self.0.iter().map(|row| row.line).collect();
        compute_totals(&lines)
    }
}

impl fmt::Display for TotalsReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write_line_header(f)?;
        for (i, row) in self.0.iter().enumerate() {
            write_line(f, i + 1, &row.description, &row.line)?;
        }
        writeln!(f)?;
        write_totals(f, &self.totals())
    }
}

pub struct ProductTable<'a>(pub &'a [Product]);

impl fmt::Display for ProductTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No products.");
        }
        writeln!(
            f,
            "{:>4}  {:<18} {:<24} {:<10} {:>16} {:>6} {:>18}",
            "ID", "Name", "Make / Model", "HSN", "Price", "GST", "Price incl. GST"
        )?;
        for p in self.0 {
            writeln!(
                f,
                "{:>4}  {:<18} {:<24} {:<10} {:>16} {:>6} {:>18}",
                p.id,
                p.name,
                format!("{} {}", p.make, p.model),
                p.hsn_code,
                format_inr(p.price),
                format_rate(p.gst_rate),
                format_inr(p.total_price()),
            )?;
        }
        Ok(())
    }
}

pub struct ClientTable<'a>(pub &'a [Client]);

impl fmt::Display for ClientTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No clients.");
        }
        writeln!(
            f,
            "{:>4}  {:<22} {:<24} {:<14} {:<14} {}",
            "ID", "Name", "Institution", "Department", "Phone", "Email"
        )?;
        for c in self.0 {
            writeln!(
                f,
                "{:>4}  {:<22} {:<24} {:<14} {:<14} {}",
                c.id, c.name, c.institution, c.department, c.phone, c.email
            )?;
        }
        Ok(())
    }
}

pub struct QuotationTable<'a>(pub &'a [Quotation]);

impl fmt::Display for QuotationTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No quotations.");
        }
        writeln!(
            f,
            "{:>4}  {:<13} {:<10} {:<24} {:<8} {:>18}",
            "ID", "Reference", "Date", "Client", "Status", "Grand total"
        )?;
        for q in self.0 {
            writeln!(
                f,
                "{:>4}  {:<13} {:<10} {:<24} {:<8} {:>18}",
                q.id,
                q.reference_id.as_str(),
                q.date.to_string(),
                q.client_name,
                q.status.as_str(),
                format_inr(q.totals().grand_total),
            )?;
        }
        Ok(())
    }
}

pub struct QuotationDetail<'a>(pub &'a Quotation);

impl fmt::Display for QuotationDetail<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let q = self.0;
        writeln!(f, "Quotation {}  [{}]", q.reference_id, q.status)?;
        writeln!(f, "Date: {}   Valid until: {}", q.date, q.valid_until)?;
        writeln!(f, "Client: {}, {}", q.client_name, q.client_company)?;
        writeln!(f)?;

        write_line_header(f)?;
        for (i, item) in q.items.iter().enumerate() {
            let label = if item.make.is_empty() && item.model.is_empty() {
                item.name.clone()
            } else {
                format!("{} ({} {})", item.name, item.make, item.model)
            };
            write_line(f, i + 1, &label, &item.line)?;
        }
        writeln!(f)?;
        write_totals(f, &q.totals())?;

        writeln!(f)?;
        writeln!(f, "Terms & Conditions")?;
        writeln!(f, "  Validity:      {}", q.terms.validity)?;
        writeln!(f, "  Delivery time: {}", q.terms.delivery_time)?;
        writeln!(f, "  Warranty:      {}", q.terms.warranty)?;
        writeln!(f, "  Payment terms: {}", q.terms.payment_terms)
    }
}
