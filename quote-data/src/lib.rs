//! Bulk loading of reference data (the product catalog) into any
//! [`quote_core::QuotationRepository`] backend.

mod loader;

pub use loader::{CatalogLoaderError, LoadSummary, ProductCatalogLoader, ProductRecord};
