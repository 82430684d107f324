//! Round trip through an on-disk SQLite file: create a quotation, reopen the
//! database through the registry, and read it back.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use quote_cli::app::{self, CreateRequest};
use quote_cli::config::{AppConfig, Overrides};
use quote_cli::records::TermsPatch;
use quote_cli::utils::ItemSpec;
use quote_core::QuotationStatus;
use rust_decimal_macros::dec;

fn temp_db_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("quote-cli-{name}-{}.db", std::process::id()))
}

#[tokio::test]
async fn quotation_survives_reopen() {
    let path = temp_db_path("reopen");
    let _ = std::fs::remove_file(&path);

    let mut config = AppConfig::default();
    config.apply_overrides(Overrides {
        connection_string: Some(path.display().to_string()),
        ..Overrides::default()
    });
    let registry = app::build_registry();

    let created = {
        let repo = registry.create(&config.db_config()).await.unwrap();
        let request = CreateRequest {
            client_id: 2,
            items: vec![ItemSpec {
                product_id: 1,
                quantity: 2,
            }],
            tax_rate: None,
            terms: TermsPatch::default(),
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let quotation = app::create_quotation(&*repo, &request, &config.quotation, today)
            .await
            .unwrap();
        repo.update_quotation_status(quotation.id, QuotationStatus::Sent)
            .await
            .unwrap();
        quotation
    };

    let repo = registry.create(&config.db_config()).await.unwrap();
    let reloaded = app::find_quotation(&*repo, created.id).await.unwrap();
    let products = repo.list_products().await.unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(reloaded.reference_id.as_str(), "QT-2026-001");
    assert_eq!(reloaded.client_name, "Prof. Anjali Verma");
    assert_eq!(reloaded.status, QuotationStatus::Sent);
    assert_eq!(reloaded.items, created.items);
    assert_eq!(reloaded.totals().grand_total, dec!(200600));
    // Reopening re-runs the seeds without duplicating them.
    assert_eq!(products.len(), 2);
}
