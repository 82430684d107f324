pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{DraftError, QuotationDraft, compute_line, compute_totals};
pub use db::repository::{QuotationRepository, RepositoryError};
pub use models::*;
