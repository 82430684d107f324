use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use quote_data::ProductCatalogLoader;
use quote_db_sqlite::SqliteRepository;
use tracing::info;

/// Load the product catalog from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - name: Product name (required)
/// - make: Manufacturer
/// - model: Model designation (required, unique per make)
/// - specification: Free-form specification (may be empty)
/// - hsn_code: HSN classification code
/// - price: Unit price before GST
/// - gst_rate: GST rate in percent (empty for the standard 18%)
#[derive(Parser, Debug)]
#[command(name = "quote-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing the product catalog
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL; the file is created if missing
    #[arg(short, long, default_value = "quotes.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        info!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        info!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        info!(dir = %seeds_dir.display(), "Running seeds");
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        info!("Seeds complete.");
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = ProductCatalogLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    info!(count = records.len(), file = %args.file.display(), "Parsed catalog records");

    let summary = ProductCatalogLoader::load(&repo, &records)
        .await
        .context("Failed to load product catalog into database")?;

    println!(
        "Loaded product catalog: {} inserted, {} updated.",
        summary.inserted, summary.updated
    );

    Ok(())
}
