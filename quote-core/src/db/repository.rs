use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Client, NewClient, NewProduct, NewQuotation, Product, Quotation, QuotationStatus,
    ReferenceId,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait QuotationRepository: Send + Sync {
    // Products
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;
    async fn get_product(&self, id: i64) -> Result<Product, RepositoryError>;
    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError>;
    async fn delete_product(&self, id: i64) -> Result<(), RepositoryError>;
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    // Clients
    async fn create_client(&self, client: NewClient) -> Result<Client, RepositoryError>;
    async fn get_client(&self, id: i64) -> Result<Client, RepositoryError>;
    async fn update_client(&self, client: &Client) -> Result<(), RepositoryError>;
    async fn delete_client(&self, id: i64) -> Result<(), RepositoryError>;
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError>;

    // Quotations
    async fn create_quotation(
        &self,
        quotation: NewQuotation,
    ) -> Result<Quotation, RepositoryError>;

    async fn get_quotation(&self, id: i64) -> Result<Quotation, RepositoryError>;

    /// Replaces the header, terms and every line item of an existing quotation.
    async fn update_quotation(&self, quotation: &Quotation) -> Result<(), RepositoryError>;

    async fn update_quotation_status(
        &self,
        id: i64,
        status: QuotationStatus,
    ) -> Result<(), RepositoryError>;

    async fn delete_quotation(&self, id: i64) -> Result<(), RepositoryError>;

    async fn list_quotations(
        &self,
        status: Option<QuotationStatus>,
    ) -> Result<Vec<Quotation>, RepositoryError>;

    async fn count_quotations(&self) -> Result<u64, RepositoryError>;

    /// Reference ids of every stored quotation, oldest first.
    async fn list_reference_ids(&self) -> Result<Vec<ReferenceId>, RepositoryError>;
}
