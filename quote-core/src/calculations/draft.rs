//! In-memory quotation builder.
//!
//! A [`QuotationDraft`] holds the client and line items of a quotation while
//! it is being assembled. Totals are never cached: every call to
//! [`QuotationDraft::totals`] recomputes them from the current lines, so
//! adding, editing or removing a line is immediately reflected.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use quote_core::calculations::QuotationDraft;
//! use quote_core::{Client, Product, ReferenceId};
//!
//! # let client = Client {
//! #     id: 1,
//! #     institution: "City Hospital".into(),
//! #     department: "Radiology".into(),
//! #     name: "Dr. Rahul Sharma".into(),
//! #     phone: String::new(),
//! #     email: String::new(),
//! #     message: String::new(),
//! #     created_at: chrono::Utc::now(),
//! # };
//! # let laptop = Product {
//! #     id: 1,
//! #     name: "Laptop".into(),
//! #     make: "Dell".into(),
//! #     model: "XPS 13".into(),
//! #     specification: String::new(),
//! #     hsn_code: "8471300".into(),
//! #     price: dec!(85000),
//! #     gst_rate: dec!(18),
//! # };
//! let mut draft = QuotationDraft::new();
//! draft.select_client(&client);
//! let line = draft.add_product(&laptop, 1);
//! draft.set_quantity(line, 2).unwrap();
//!
//! assert_eq!(draft.totals().grand_total, dec!(200600));
//!
//! let date = NaiveDate::from_ymd_opt(2025, 5, 15).unwrap();
//! let quotation = draft.finalize(ReferenceId::next(2025, 0), date, 30).unwrap();
//! assert_eq!(quotation.reference_id.as_str(), "QT-2025-001");
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{coerce_quantity, non_negative};
use crate::calculations::compute_totals;
use crate::models::{
    Client, NewQuotation, Product, ProductLineItem, QuotationItem, QuotationStatus,
    QuotationTotals, ReferenceId, TermsConditions, valid_until,
};

/// Errors that can occur while editing or finalizing a draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    /// The line index does not refer to an existing line.
    #[error("no line item at index {0}")]
    LineNotFound(usize),

    /// A quotation needs a client before it can be finalized.
    #[error("no client selected")]
    MissingClient,

    /// A quotation needs at least one line item before it can be finalized.
    #[error("quotation has no line items")]
    NoLineItems,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DraftClient {
    id: i64,
    name: String,
    company: String,
}

#[derive(Debug, Clone, Default)]
pub struct QuotationDraft {
    client: Option<DraftClient>,
    items: Vec<QuotationItem>,
    terms: TermsConditions,
}

impl QuotationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terms(terms: TermsConditions) -> Self {
        Self {
            terms,
            ..Self::default()
        }
    }

    pub fn select_client(
        &mut self,
        client: &Client,
    ) {
        self.client = Some(DraftClient {
            id: client.id,
            name: client.name.clone(),
            company: client.institution.clone(),
        });
    }

    pub fn client_id(&self) -> Option<i64> {
        self.client.as_ref().map(|c| c.id)
    }

    /// Terms that [`finalize`](Self::finalize) will copy into the quotation.
    pub fn terms_mut(&mut self) -> &mut TermsConditions {
        &mut self.terms
    }

    /// Adds a catalog product, priced at its current price and GST rate.
    /// Returns the index of the new line.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: i64,
    ) -> usize {
        debug!(product_id = product.id, quantity, "adding product to draft");
        self.add_line(QuotationItem {
            product_id: Some(product.id),
            name: product.name.clone(),
            make: product.make.clone(),
            model: product.model.clone(),
            specification: product.specification.clone(),
            hsn_code: product.hsn_code.clone(),
            line: ProductLineItem::new(product.price, quantity, product.gst_rate),
        })
    }

    pub fn add_line(
        &mut self,
        item: QuotationItem,
    ) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn set_quantity(
        &mut self,
        index: usize,
        quantity: i64,
    ) -> Result<(), DraftError> {
        let item = self.line_mut(index)?;
        item.line.quantity = coerce_quantity(quantity);
        Ok(())
    }

    pub fn set_tax_rate(
        &mut self,
        index: usize,
        tax_rate: Decimal,
    ) -> Result<(), DraftError> {
        let item = self.line_mut(index)?;
        item.line.tax_rate = non_negative(tax_rate, "tax_rate");
        Ok(())
    }

    /// Removes and returns the line at `index`; later lines shift down.
    pub fn remove_line(
        &mut self,
        index: usize,
    ) -> Result<QuotationItem, DraftError> {
        if index >= self.items.len() {
            return Err(DraftError::LineNotFound(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn lines(&self) -> &[QuotationItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> QuotationTotals {
        let lines: Vec<_> = self.items.iter().map(|item| item.line).collect();
        compute_totals(&lines)
    }

    /// Turns the draft into a quotation ready to be stored.
    ///
    /// # Errors
    ///
    /// * [`DraftError::MissingClient`] if no client was selected.
    /// * [`DraftError::NoLineItems`] if the draft has no lines.
    pub fn finalize(
        self,
        reference_id: ReferenceId,
        date: NaiveDate,
        validity_days: u32,
    ) -> Result<NewQuotation, DraftError> {
        let client = self.client.ok_or(DraftError::MissingClient)?;
        if self.items.is_empty() {
            return Err(DraftError::NoLineItems);
        }

        Ok(NewQuotation {
            reference_id,
            date,
            valid_until: valid_until(date, validity_days),
            client_id: client.id,
            client_name: client.name,
            client_company: client.company,
            items: self.items,
            terms: self.terms,
            status: QuotationStatus::Draft,
        })
    }

    fn line_mut(
        &mut self,
        index: usize,
    ) -> Result<&mut QuotationItem, DraftError> {
        self.items
            .get_mut(index)
            .ok_or(DraftError::LineNotFound(index))
    }
}
