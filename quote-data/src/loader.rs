use std::collections::HashMap;
use std::io::Read;

use quote_core::{DEFAULT_GST_RATE, NewProduct, Product, QuotationRepository, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading the product catalog.
#[derive(Debug, Error)]
pub enum CatalogLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for CatalogLoaderError {
    fn from(err: csv::Error) -> Self {
        CatalogLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the product catalog CSV file.
///
/// Columns: `name,make,model,specification,hsn_code,price,gst_rate`.
/// `specification` may be empty and an empty `gst_rate` means the standard
/// 18% rate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub specification: String,
    pub hsn_code: String,
    pub price: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub gst_rate: Option<Decimal>,
}

impl ProductRecord {
    fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_string(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            specification: self.specification.trim().to_string(),
            hsn_code: self.hsn_code.trim().to_string(),
            price: self.price,
            gst_rate: self.gst_rate.unwrap_or(DEFAULT_GST_RATE),
        }
    }
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Outcome of a catalog load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Loader for product catalog data from CSV files.
///
/// Works through the [`QuotationRepository`] trait, so any backend can be
/// loaded.
pub struct ProductCatalogLoader;

impl ProductCatalogLoader {
    /// Parse and validate catalog records from a CSV reader.
    ///
    /// Rows with an empty name or model, or a negative price or rate, are
    /// rejected with their 1-based data row number.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<ProductRecord>, CatalogLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: ProductRecord = result?;
            validate(index + 1, &record)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load catalog records into the repository.
    ///
    /// Existing products are matched on (make, model) and updated in place;
    /// everything else is inserted. Loading the same file twice leaves the
    /// catalog unchanged.
    pub async fn load<R: QuotationRepository + ?Sized>(
        repo: &R,
        records: &[ProductRecord],
    ) -> Result<LoadSummary, CatalogLoaderError> {
        let mut existing: HashMap<(String, String), Product> = repo
            .list_products()
            .await?
            .into_iter()
            .map(|product| ((product.make.clone(), product.model.clone()), product))
            .collect();

        let mut summary = LoadSummary::default();

        for record in records {
            let new_product = record.clone().into_new_product();
            let key = (new_product.make.clone(), new_product.model.clone());

            match existing.get(&key) {
                Some(current) => {
                    let product = Product {
                        id: current.id,
                        name: new_product.name,
                        make: new_product.make,
                        model: new_product.model,
                        specification: new_product.specification,
                        hsn_code: new_product.hsn_code,
                        price: new_product.price,
                        gst_rate: new_product.gst_rate,
                    };
                    repo.update_product(&product).await?;
                    debug!(id = product.id, make = %product.make, model = %product.model, "product updated");
                    existing.insert(key, product);
                    summary.updated += 1;
                }
                None => {
                    let product = repo.create_product(new_product).await?;
                    existing.insert(key, product);
                    summary.inserted += 1;
                }
            }
        }

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "product catalog loaded"
        );
        Ok(summary)
    }
}

fn validate(
    row: usize,
    record: &ProductRecord,
) -> Result<(), CatalogLoaderError> {
    let invalid = |reason: &str| CatalogLoaderError::InvalidRecord {
        row,
        reason: reason.to_string(),
    };

    if record.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if record.model.trim().is_empty() {
        return Err(invalid("model is empty"));
    }
    if record.price.is_sign_negative() && !record.price.is_zero() {
        return Err(invalid("price is negative"));
    }
    if record.gst_rate.is_some_and(|rate| rate.is_sign_negative() && !rate.is_zero()) {
        return Err(invalid("gst_rate is negative"));
    }
    Ok(())
}
