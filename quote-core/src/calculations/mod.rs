//! Quotation calculations.
//!
//! This module provides the GST totals engine used by every quotation, the
//! draft builder that keeps a quotation's line items in memory while it is
//! being assembled, and the shared rounding/coercion helpers.

pub mod common;
pub mod draft;
pub mod totals;

pub use draft::{DraftError, QuotationDraft};
pub use totals::{compute_line, compute_totals};
