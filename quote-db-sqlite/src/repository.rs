use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quote_core::{
    Client, NewClient, NewProduct, NewQuotation, Product, ProductLineItem, Quotation,
    QuotationItem, QuotationRepository, QuotationStatus, ReferenceId, RepositoryError,
    TermsConditions,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `database_url`: a bare path, a `sqlite:` URL or `:memory:`.
    /// Database files are created when missing.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every pooled connection to an in-memory database would otherwise
        // compete for the same shared-cache locks.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "seed file applied");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn database_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    // Rows written by SQLite defaults use `datetime('now')`; rows written here
    // carry microseconds.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| RepositoryError::Database(format!("Failed to parse datetime '{}': {}", s, e)))
}

fn get_datetime(
    row: &SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: String = row.try_get(column).map_err(database_error)?;
    parse_datetime(&raw)
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    Ok(Product {
        id: row.try_get("id").map_err(database_error)?,
        name: row.try_get("name").map_err(database_error)?,
        make: row.try_get("make").map_err(database_error)?,
        model: row.try_get("model").map_err(database_error)?,
        specification: row.try_get("specification").map_err(database_error)?,
        hsn_code: row.try_get("hsn_code").map_err(database_error)?,
        price: get_decimal(row, "price")?,
        gst_rate: get_decimal(row, "gst_rate")?,
    })
}

fn row_to_client(row: &SqliteRow) -> Result<Client, RepositoryError> {
    Ok(Client {
        id: row.try_get("id").map_err(database_error)?,
        institution: row.try_get("institution").map_err(database_error)?,
        department: row.try_get("department").map_err(database_error)?,
        name: row.try_get("name").map_err(database_error)?,
        phone: row.try_get("phone").map_err(database_error)?,
        email: row.try_get("email").map_err(database_error)?,
        message: row.try_get("message").map_err(database_error)?,
        created_at: get_datetime(row, "created_at")?,
    })
}

fn row_to_item(row: &SqliteRow) -> Result<QuotationItem, RepositoryError> {
    let quantity: i64 = row.try_get("quantity").map_err(database_error)?;
    Ok(QuotationItem {
        product_id: row.try_get("product_id").map_err(database_error)?,
        name: row.try_get("name").map_err(database_error)?,
        make: row.try_get("make").map_err(database_error)?,
        model: row.try_get("model").map_err(database_error)?,
        specification: row.try_get("specification").map_err(database_error)?,
        hsn_code: row.try_get("hsn_code").map_err(database_error)?,
        line: ProductLineItem::new(
            get_decimal(row, "unit_price")?,
            quantity,
            get_decimal(row, "tax_rate")?,
        ),
    })
}

fn row_to_quotation(
    row: &SqliteRow,
    items: Vec<QuotationItem>,
) -> Result<Quotation, RepositoryError> {
    let status_str: String = row.try_get("status").map_err(database_error)?;
    let status = QuotationStatus::parse(&status_str).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid quotation status: {}", status_str))
    })?;
    let reference_id: String = row.try_get("reference_id").map_err(database_error)?;

    Ok(Quotation {
        id: row.try_get("id").map_err(database_error)?,
        reference_id: ReferenceId::from(reference_id),
        date: row
            .try_get::<NaiveDate, _>("quotation_date")
            .map_err(database_error)?,
        valid_until: row
            .try_get::<NaiveDate, _>("valid_until")
            .map_err(database_error)?,
        client_id: row.try_get("client_id").map_err(database_error)?,
        client_name: row.try_get("client_name").map_err(database_error)?,
        client_company: row.try_get("client_company").map_err(database_error)?,
        items,
        terms: TermsConditions {
            validity: row.try_get("terms_validity").map_err(database_error)?,
            delivery_time: row.try_get("terms_delivery_time").map_err(database_error)?,
            warranty: row.try_get("terms_warranty").map_err(database_error)?,
            payment_terms: row.try_get("terms_payment_terms").map_err(database_error)?,
        },
        status,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, make, model, specification, hsn_code, price, gst_rate";

const CLIENT_COLUMNS: &str =
    "id, institution, department, name, phone, email, message, created_at";

const QUOTATION_COLUMNS: &str = "id, reference_id, quotation_date, valid_until, client_id,
    client_name, client_company, terms_validity, terms_delivery_time, terms_warranty,
    terms_payment_terms, status, created_at, updated_at";

const ITEM_COLUMNS: &str = "quotation_id, position, product_id, name, make, model,
    specification, hsn_code, unit_price, quantity, tax_rate";

async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    quotation_id: i64,
    items: &[QuotationItem],
) -> Result<(), RepositoryError> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quotation_items (
                quotation_id, position, product_id, name, make, model,
                specification, hsn_code, unit_price, quantity, tax_rate
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(quotation_id)
        .bind(position as i64)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(&item.make)
        .bind(&item.model)
        .bind(&item.specification)
        .bind(&item.hsn_code)
        .bind(decimal_to_text(item.line.unit_price))
        .bind(i64::from(item.line.quantity))
        .bind(decimal_to_text(item.line.tax_rate))
        .execute(&mut **tx)
        .await
        .map_err(database_error)?;
    }
    Ok(())
}

impl SqliteRepository {
    async fn fetch_items(
        &self,
        quotation_id: i64,
    ) -> Result<Vec<QuotationItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM quotation_items WHERE quotation_id = ? ORDER BY position"
        ))
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_item).collect()
    }
}

#[async_trait]
impl QuotationRepository for SqliteRepository {
    // ── products ─────────────────────────────────────────────────────────

    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO products (name, make, model, specification, hsn_code, price, gst_rate)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.make)
        .bind(&product.model)
        .bind(&product.specification)
        .bind(&product.hsn_code)
        .bind(decimal_to_text(product.price))
        .bind(decimal_to_text(product.gst_rate))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        let id = result.last_insert_rowid();
        debug!(id, name = %product.name, "product created");
        self.get_product(id).await
    }

    async fn get_product(
        &self,
        id: i64,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_product(&row)
    }

    async fn update_product(
        &self,
        product: &Product,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET
                name = ?, make = ?, model = ?, specification = ?, hsn_code = ?,
                price = ?, gst_rate = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.make)
        .bind(&product.model)
        .bind(&product.specification)
        .bind(&product.hsn_code)
        .bind(decimal_to_text(product.price))
        .bind(decimal_to_text(product.gst_rate))
        .bind(product.id)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.iter().map(row_to_product).collect()
    }

    // ── clients ──────────────────────────────────────────────────────────

    async fn create_client(
        &self,
        client: NewClient,
    ) -> Result<Client, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO clients (institution, department, name, phone, email, message, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&client.institution)
        .bind(&client.department)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.message)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        self.get_client(result.last_insert_rowid()).await
    }

    async fn get_client(
        &self,
        id: i64,
    ) -> Result<Client, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_client(&row)
    }

    async fn update_client(
        &self,
        client: &Client,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE clients SET
                institution = ?, department = ?, name = ?, phone = ?, email = ?, message = ?
             WHERE id = ?",
        )
        .bind(&client.institution)
        .bind(&client.department)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.message)
        .bind(client.id)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_client(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.iter().map(row_to_client).collect()
    }

    // ── quotations ───────────────────────────────────────────────────────

    async fn create_quotation(
        &self,
        quotation: NewQuotation,
    ) -> Result<Quotation, RepositoryError> {
        let now = format_timestamp(Utc::now());
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let result = sqlx::query(
            "INSERT INTO quotations (
                reference_id, quotation_date, valid_until, client_id, client_name,
                client_company, terms_validity, terms_delivery_time, terms_warranty,
                terms_payment_terms, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(quotation.reference_id.as_str())
        .bind(quotation.date)
        .bind(quotation.valid_until)
        .bind(quotation.client_id)
        .bind(&quotation.client_name)
        .bind(&quotation.client_company)
        .bind(&quotation.terms.validity)
        .bind(&quotation.terms.delivery_time)
        .bind(&quotation.terms.warranty)
        .bind(&quotation.terms.payment_terms)
        .bind(quotation.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        let id = result.last_insert_rowid();
        insert_items(&mut tx, id, &quotation.items).await?;
        tx.commit().await.map_err(database_error)?;

        info!(
            id,
            reference_id = %quotation.reference_id,
            items = quotation.items.len(),
            "quotation created"
        );
        self.get_quotation(id).await
    }

    async fn get_quotation(
        &self,
        id: i64,
    ) -> Result<Quotation, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(RepositoryError::NotFound)?;

        let items = self.fetch_items(id).await?;
        row_to_quotation(&row, items)
    }

    async fn update_quotation(
        &self,
        quotation: &Quotation,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let result = sqlx::query(
            "UPDATE quotations SET
                reference_id = ?, quotation_date = ?, valid_until = ?, client_id = ?,
                client_name = ?, client_company = ?, terms_validity = ?,
                terms_delivery_time = ?, terms_warranty = ?, terms_payment_terms = ?,
                status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(quotation.reference_id.as_str())
        .bind(quotation.date)
        .bind(quotation.valid_until)
        .bind(quotation.client_id)
        .bind(&quotation.client_name)
        .bind(&quotation.client_company)
        .bind(&quotation.terms.validity)
        .bind(&quotation.terms.delivery_time)
        .bind(&quotation.terms.warranty)
        .bind(&quotation.terms.payment_terms)
        .bind(quotation.status.as_str())
        .bind(format_timestamp(Utc::now()))
        .bind(quotation.id)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM quotation_items WHERE quotation_id = ?")
            .bind(quotation.id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;
        insert_items(&mut tx, quotation.id, &quotation.items).await?;

        tx.commit().await.map_err(database_error)
    }

    async fn update_quotation_status(
        &self,
        id: i64,
        status: QuotationStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE quotations SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(format_timestamp(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        debug!(id, %status, "quotation status updated");
        Ok(())
    }

    async fn delete_quotation(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query("DELETE FROM quotation_items WHERE quotation_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        let result = sqlx::query("DELETE FROM quotations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(database_error)
    }

    async fn list_quotations(
        &self,
        status: Option<QuotationStatus>,
    ) -> Result<Vec<Quotation>, RepositoryError> {
        let (rows, item_rows) = match status {
            Some(status) => {
                let rows = sqlx::query(&format!(
                    "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE status = ? ORDER BY id"
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(database_error)?;
                let item_rows = sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM quotation_items
                     WHERE quotation_id IN (SELECT id FROM quotations WHERE status = ?)
                     ORDER BY quotation_id, position"
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(database_error)?;
                (rows, item_rows)
            }
            None => {
                let rows =
                    sqlx::query(&format!("SELECT {QUOTATION_COLUMNS} FROM quotations ORDER BY id"))
                        .fetch_all(&self.pool)
                        .await
                        .map_err(database_error)?;
                let item_rows = sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM quotation_items ORDER BY quotation_id, position"
                ))
                .fetch_all(&self.pool)
                .await
                .map_err(database_error)?;
                (rows, item_rows)
            }
        };
        debug!(quotations = rows.len(), items = item_rows.len(), "listed quotations");

        let mut items: HashMap<i64, Vec<QuotationItem>> = HashMap::new();
        for row in &item_rows {
            let quotation_id: i64 = row.try_get("quotation_id").map_err(database_error)?;
            items.entry(quotation_id).or_default().push(row_to_item(row)?);
        }

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id").map_err(database_error)?;
                row_to_quotation(row, items.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn count_quotations(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotations")
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_reference_ids(&self) -> Result<Vec<ReferenceId>, RepositoryError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT reference_id FROM quotations ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(ids.into_iter().map(ReferenceId::from).collect())
    }
}
