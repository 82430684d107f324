mod client;
mod line_item;
mod product;
mod quotation;

pub use client::{Client, NewClient};
pub use line_item::{LineAmounts, ProductLineItem, QuotationTotals};
pub use product::{DEFAULT_GST_RATE, NewProduct, Product};
pub use quotation::{
    DEFAULT_VALIDITY_DAYS, NewQuotation, Quotation, QuotationItem, QuotationStatus, ReferenceId,
    TermsConditions, valid_until,
};
