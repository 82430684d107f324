use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calculations::compute_totals;
use crate::models::{ProductLineItem, QuotationTotals};

/// Days a quotation stays valid unless configured otherwise.
pub const DEFAULT_VALIDITY_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl QuotationStatus {
    pub fn all() -> &'static [QuotationStatus] {
        &[
            QuotationStatus::Draft,
            QuotationStatus::Sent,
            QuotationStatus::Accepted,
            QuotationStatus::Rejected,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial terms printed at the bottom of a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermsConditions {
    pub validity: String,
    pub delivery_time: String,
    pub warranty: String,
    pub payment_terms: String,
}

impl Default for TermsConditions {
    fn default() -> Self {
        Self {
            validity: "30 days from the date of quotation".to_string(),
            delivery_time: "2-3 weeks after order confirmation".to_string(),
            warranty: "1 year standard warranty".to_string(),
            payment_terms: "100% advance payment".to_string(),
        }
    }
}

/// Human-facing quotation number, e.g. `QT-2025-001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Reference for the next quotation of `year`, given how many quotations
    /// already exist.
    ///
    /// ```
    /// use quote_core::ReferenceId;
    ///
    /// assert_eq!(ReferenceId::next(2025, 0).as_str(), "QT-2025-001");
    /// assert_eq!(ReferenceId::next(2025, 41).as_str(), "QT-2025-042");
    /// ```
    pub fn next(
        year: i32,
        existing: u64,
    ) -> Self {
        Self(format!("QT-{year}-{:03}", existing.saturating_add(1)))
    }

    /// Like [`next`](Self::next), but never reuses a sequence number already
    /// taken in `year`.
    ///
    /// After a delete the count of quotations falls below the highest issued
    /// number, so the count alone would hand out an id that is still in use.
    ///
    /// ```
    /// use quote_core::ReferenceId;
    ///
    /// let taken = [ReferenceId::next(2025, 1), ReferenceId::next(2024, 7)];
    ///
    /// assert_eq!(ReferenceId::next_unused(2025, 1, &taken).as_str(), "QT-2025-003");
    /// ```
    pub fn next_unused<'a>(
        year: i32,
        existing: u64,
        taken: impl IntoIterator<Item = &'a ReferenceId>,
    ) -> Self {
        let highest = taken
            .into_iter()
            .filter_map(|id| id.sequence_in(year))
            .max()
            .unwrap_or(0);
        Self::next(year, existing.max(highest))
    }

    /// Sequence number of a `QT-<year>-<n>` reference, if it belongs to `year`.
    pub fn sequence_in(
        &self,
        year: i32,
    ) -> Option<u64> {
        self.0
            .strip_prefix(&format!("QT-{year}-"))?
            .parse()
            .ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReferenceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last day a quotation issued on `date` is valid.
pub fn valid_until(
    date: NaiveDate,
    validity_days: u32,
) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(validity_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// A product entry within a quotation.
///
/// Descriptive fields are copied from the catalog when the line is added so
/// later catalog edits don't rewrite issued quotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationItem {
    pub product_id: Option<i64>,
    pub name: String,
    pub make: String,
    pub model: String,
    pub specification: String,
    pub hsn_code: String,
    #[serde(flatten)]
    pub line: ProductLineItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: i64,
    pub reference_id: ReferenceId,
    pub date: NaiveDate,
    pub valid_until: NaiveDate,
    pub client_id: i64,
    pub client_name: String,
    pub client_company: String,
    pub items: Vec<QuotationItem>,
    pub terms: TermsConditions,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    pub fn line_items(&self) -> Vec<ProductLineItem> {
        self.items.iter().map(|item| item.line).collect()
    }

    pub fn totals(&self) -> QuotationTotals {
        compute_totals(&self.line_items())
    }
}

/// For creating new quotations (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuotation {
    pub reference_id: ReferenceId,
    pub date: NaiveDate,
    pub valid_until: NaiveDate,
    pub client_id: i64,
    pub client_name: String,
    pub client_company: String,
    pub items: Vec<QuotationItem>,
    pub terms: TermsConditions,
    pub status: QuotationStatus,
}

impl NewQuotation {
    pub fn totals(&self) -> QuotationTotals {
        let lines: Vec<_> = self.items.iter().map(|item| item.line).collect();
        compute_totals(&lines)
    }
}
