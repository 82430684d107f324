//! Add, edit and delete handlers for clients, catalog products and
//! quotation terms.
//!
//! The `*Fields` structs carry everything needed for a new record; the
//! `*Patch` structs carry only what an edit changes. Both derive
//! [`clap::Args`] so the binary can flatten them straight into its
//! subcommands.

use anyhow::{Context, Result};
use clap::Args;
use quote_core::{
    Client, DEFAULT_GST_RATE, NewClient, NewProduct, Product, Quotation, QuotationRepository,
    QuotationStatus, RepositoryError, TermsConditions,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::utils::parse_decimal;

/// A client or product that cannot be saved as given.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },
}

fn require(
    value: &str,
    field: &'static str,
) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::MissingField(field));
    }
    Ok(())
}

fn require_non_negative(
    value: Decimal,
    field: &'static str,
) -> Result<(), RecordError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RecordError::Negative { field, value });
    }
    Ok(())
}

fn parse_amount(s: &str) -> Result<Decimal, String> {
    parse_decimal(s).map_err(|e| e.to_string())
}

/// Turns a missing row into "`<kind> <id> not found`" and anything else
/// into a contextual error.
fn lookup_error(
    err: RepositoryError,
    kind: &str,
    id: i64,
) -> anyhow::Error {
    match err {
        RepositoryError::NotFound => anyhow::anyhow!("{kind} {id} not found"),
        other => anyhow::Error::new(other).context(format!("failed to access {kind} {id}")),
    }
}

fn replace(
    target: &mut String,
    value: &Option<String>,
) {
    if let Some(value) = value {
        *target = value.trim().to_string();
    }
}

// ─── clients ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ClientFields {
    /// Contact person.
    #[arg(long)]
    pub name: String,
    /// Hospital, university or company.
    #[arg(long)]
    pub institution: String,
    #[arg(long)]
    pub department: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub email: String,
    /// Free-text note about the enquiry.
    #[arg(long, default_value = "")]
    pub message: String,
}

impl ClientFields {
    pub fn into_new_client(self) -> Result<NewClient, RecordError> {
        let client = NewClient {
            institution: self.institution.trim().to_string(),
            department: self.department.trim().to_string(),
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        };
        validate_client(&client.name, &client.institution, &client.department, &client.phone)?;
        Ok(client)
    }
}

fn validate_client(
    name: &str,
    institution: &str,
    department: &str,
    phone: &str,
) -> Result<(), RecordError> {
    require(name, "name")?;
    require(institution, "institution")?;
    require(department, "department")?;
    require(phone, "phone")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ClientPatch {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub institution: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
}

impl ClientPatch {
    pub fn apply(
        &self,
        client: &mut Client,
    ) -> Result<(), RecordError> {
        replace(&mut client.name, &self.name);
        replace(&mut client.institution, &self.institution);
        replace(&mut client.department, &self.department);
        replace(&mut client.phone, &self.phone);
        replace(&mut client.email, &self.email);
        replace(&mut client.message, &self.message);
        validate_client(&client.name, &client.institution, &client.department, &client.phone)
    }
}

pub async fn add_client(
    repo: &dyn QuotationRepository,
    fields: ClientFields,
) -> Result<Client> {
    let client = repo
        .create_client(fields.into_new_client()?)
        .await
        .context("failed to save client")?;
    info!(id = client.id, name = %client.name, "client added");
    Ok(client)
}

pub async fn edit_client(
    repo: &dyn QuotationRepository,
    id: i64,
    patch: &ClientPatch,
) -> Result<Client> {
    let mut client = repo
        .get_client(id)
        .await
        .map_err(|e| lookup_error(e, "client", id))?;
    patch.apply(&mut client)?;
    repo.update_client(&client)
        .await
        .map_err(|e| lookup_error(e, "client", id))?;
    info!(id, "client updated");
    Ok(client)
}

pub async fn delete_client(
    repo: &dyn QuotationRepository,
    id: i64,
) -> Result<()> {
    repo.delete_client(id)
        .await
        .map_err(|e| lookup_error(e, "client", id))?;
    info!(id, "client deleted");
    Ok(())
}

// ─── products ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ProductFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub make: String,
    #[arg(long)]
    pub model: String,
    #[arg(long, default_value = "")]
    pub specification: String,
    #[arg(long)]
    pub hsn_code: String,
    /// Unit price before GST.
    #[arg(long, value_parser = parse_amount)]
    pub price: Decimal,
    /// GST percent; 18 when omitted.
    #[arg(long, value_parser = parse_amount)]
    pub gst_rate: Option<Decimal>,
}

impl ProductFields {
    pub fn into_new_product(self) -> Result<NewProduct, RecordError> {
        let product = NewProduct {
            name: self.name.trim().to_string(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            specification: self.specification.trim().to_string(),
            hsn_code: self.hsn_code.trim().to_string(),
            price: self.price,
            gst_rate: self.gst_rate.unwrap_or(DEFAULT_GST_RATE),
        };
        validate_product(
            &product.name,
            &product.make,
            &product.model,
            &product.hsn_code,
            product.price,
            product.gst_rate,
        )?;
        Ok(product)
    }
}

fn validate_product(
    name: &str,
    make: &str,
    model: &str,
    hsn_code: &str,
    price: Decimal,
    gst_rate: Decimal,
) -> Result<(), RecordError> {
    require(name, "name")?;
    require(make, "make")?;
    require(model, "model")?;
    require(hsn_code, "hsn_code")?;
    require_non_negative(price, "price")?;
    require_non_negative(gst_rate, "gst_rate")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ProductPatch {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub make: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub specification: Option<String>,
    #[arg(long)]
    pub hsn_code: Option<String>,
    #[arg(long, value_parser = parse_amount)]
    pub price: Option<Decimal>,
    #[arg(long, value_parser = parse_amount)]
    pub gst_rate: Option<Decimal>,
}

impl ProductPatch {
    pub fn apply(
        &self,
        product: &mut Product,
    ) -> Result<(), RecordError> {
        replace(&mut product.name, &self.name);
        replace(&mut product.make, &self.make);
        replace(&mut product.model, &self.model);
        replace(&mut product.specification, &self.specification);
        replace(&mut product.hsn_code, &self.hsn_code);
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(rate) = self.gst_rate {
            product.gst_rate = rate;
        }
        validate_product(
            &product.name,
            &product.make,
            &product.model,
            &product.hsn_code,
            product.price,
            product.gst_rate,
        )
    }
}

pub async fn add_product(
    repo: &dyn QuotationRepository,
    fields: ProductFields,
) -> Result<Product> {
    let product = repo
        .create_product(fields.into_new_product()?)
        .await
        .context("failed to save product")?;
    info!(id = product.id, name = %product.name, "product added");
    Ok(product)
}

pub async fn edit_product(
    repo: &dyn QuotationRepository,
    id: i64,
    patch: &ProductPatch,
) -> Result<Product> {
    let mut product = repo
        .get_product(id)
        .await
        .map_err(|e| lookup_error(e, "product", id))?;
    patch.apply(&mut product)?;
    repo.update_product(&product)
        .await
        .map_err(|e| lookup_error(e, "product", id))?;
    info!(id, "product updated");
    Ok(product)
}

/// Removes a product from the catalog. Quotations that already list it keep
/// their copy of the line.
pub async fn delete_product(
    repo: &dyn QuotationRepository,
    id: i64,
) -> Result<()> {
    repo.delete_product(id)
        .await
        .map_err(|e| lookup_error(e, "product", id))?;
    info!(id, "product deleted");
    Ok(())
}

// ─── quotation terms ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct TermsPatch {
    /// Validity wording, e.g. "45 days from the date of quotation".
    #[arg(long = "terms-validity")]
    pub validity: Option<String>,
    #[arg(long)]
    pub delivery_time: Option<String>,
    #[arg(long)]
    pub warranty: Option<String>,
    #[arg(long)]
    pub payment_terms: Option<String>,
}

impl TermsPatch {
    pub fn is_empty(&self) -> bool {
        self.validity.is_none()
            && self.delivery_time.is_none()
            && self.warranty.is_none()
            && self.payment_terms.is_none()
    }

    pub fn apply(
        &self,
        terms: &mut TermsConditions,
    ) {
        replace(&mut terms.validity, &self.validity);
        replace(&mut terms.delivery_time, &self.delivery_time);
        replace(&mut terms.warranty, &self.warranty);
        replace(&mut terms.payment_terms, &self.payment_terms);
    }
}

/// Rewrites the terms and, optionally, the status of a saved quotation.
/// Line items are left as they are.
pub async fn edit_quotation(
    repo: &dyn QuotationRepository,
    id: i64,
    terms: &TermsPatch,
    status: Option<QuotationStatus>,
) -> Result<Quotation> {
    let mut quotation = repo
        .get_quotation(id)
        .await
        .map_err(|e| lookup_error(e, "quotation", id))?;
    terms.apply(&mut quotation.terms);
    if let Some(status) = status {
        quotation.status = status;
    }
    repo.update_quotation(&quotation)
        .await
        .map_err(|e| lookup_error(e, "quotation", id))?;
    info!(id, reference_id = %quotation.reference_id, "quotation updated");
    repo.get_quotation(id)
        .await
        .map_err(|e| lookup_error(e, "quotation", id))
}
