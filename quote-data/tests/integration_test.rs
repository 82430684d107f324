//! Integration tests for product catalog loading using the SQLite backend.

use pretty_assertions::assert_eq;
use quote_core::QuotationRepository;
use quote_data::{CatalogLoaderError, LoadSummary, ProductCatalogLoader};
use quote_db_sqlite::SqliteRepository;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const TEST_CSV: &str = include_str!("../test-data/products.csv");

/// Sets up a test database with migrations run but no seed data.
async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

#[tokio::test]
async fn test_load_full_catalog() {
    let repo = setup_test_db().await;

    let records = ProductCatalogLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
    let summary = ProductCatalogLoader::load(&repo, &records)
        .await
        .expect("Failed to load catalog");

    assert_eq!(summary, LoadSummary { inserted: 5, updated: 0 });

    let products = repo.list_products().await.expect("Failed to list products");
    assert_eq!(products.len(), 5);
    assert_eq!(products[0].name, "Laptop");
    assert_eq!(products[0].total_price(), dec!(100300));
    assert_eq!(products[2].price, dec!(45000.50));
    assert_eq!(products[2].gst_rate, dec!(18));
    assert_eq!(products[3].gst_rate, dec!(12));
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let repo = setup_test_db().await;
    let records = ProductCatalogLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

    ProductCatalogLoader::load(&repo, &records)
        .await
        .expect("First load failed");
    let before = repo.list_products().await.expect("Failed to list products");

    let summary = ProductCatalogLoader::load(&repo, &records)
        .await
        .expect("Second load failed");
    let after = repo.list_products().await.expect("Failed to list products");

    assert_eq!(summary, LoadSummary { inserted: 0, updated: 5 });
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_load_updates_existing_product_by_make_and_model() {
    let repo = setup_test_db().await;
    let records = ProductCatalogLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
    ProductCatalogLoader::load(&repo, &records)
        .await
        .expect("First load failed");

    let revised = "name,make,model,specification,hsn_code,price,gst_rate\n\
                   Laptop,Dell,XPS 13,\"i7, 32GB RAM, 1TB SSD\",8471300,99000,18\n\
                   Tablet,Apple,iPad Air,,8471300,60000,18";
    let records = ProductCatalogLoader::parse(revised.as_bytes()).expect("Failed to parse CSV");
    let summary = ProductCatalogLoader::load(&repo, &records)
        .await
        .expect("Second load failed");

    assert_eq!(summary, LoadSummary { inserted: 1, updated: 1 });

    let products = repo.list_products().await.expect("Failed to list products");
    assert_eq!(products.len(), 6);
    let laptop = products
        .iter()
        .find(|p| p.model == "XPS 13")
        .expect("laptop missing");
    assert_eq!(laptop.id, 1);
    assert_eq!(laptop.price, dec!(99000));
    assert_eq!(laptop.specification, "i7, 32GB RAM, 1TB SSD");
}

#[tokio::test]
async fn test_load_works_on_seeded_database() {
    let repo = setup_test_db().await;
    let seeds = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("quote-db-sqlite")
        .join("seeds");
    repo.run_seeds(&seeds).await.expect("Failed to run seeds");

    let records = ProductCatalogLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");
    let summary = ProductCatalogLoader::load(&repo, &records)
        .await
        .expect("Failed to load catalog");

    // The seeded laptop and smartphone are matched, not duplicated.
    assert_eq!(summary, LoadSummary { inserted: 3, updated: 2 });
}

#[tokio::test]
async fn test_invalid_row_loads_nothing() {
    let repo = setup_test_db().await;
    let input = "name,make,model,specification,hsn_code,price,gst_rate\n\
                 Laptop,Dell,XPS 13,,8471300,85000,18\n\
                 ,Apple,iPhone 15,,8517120,90000,18";

    let err = ProductCatalogLoader::parse(input.as_bytes()).expect_err("Should fail");

    let CatalogLoaderError::InvalidRecord { row, reason } = err else {
        panic!("Expected InvalidRecord error, got: {:?}", err);
    };
    assert_eq!(row, 2);
    assert_eq!(reason, "name is empty");
    assert!(repo.list_products().await.expect("Failed to list").is_empty());
}
