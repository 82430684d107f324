use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use quote_cli::app::{
    self, ClientTable, CreateRequest, ProductTable, QuotationDetail, QuotationTable, TotalsReport,
};
use quote_cli::config::{AppConfig, DEFAULT_CONFIG_FILE, Overrides};
use quote_cli::records::{
    self, ClientFields, ClientPatch, ProductFields, ProductPatch, TermsPatch,
};
use quote_cli::utils::{ItemSpec, format_inr, parse_decimal, parse_item_spec};
use quote_cli::{csv_loader, logging};
use quote_core::QuotationStatus;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// GST quotation totals and quotation records.
///
/// Computes subtotal, GST and grand total for quotation line items, and
/// manages the product catalog, clients and saved quotations.
#[derive(Debug, Parser)]
#[command(name = "quote", version)]
struct Cli {
    /// Configuration file. Defaults to `quote.toml` in the working
    /// directory; a missing default file is not an error.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `quotes.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or filter directive (e.g. `debug`, `quote_core=trace`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Hide log output on the console.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute totals for a line-item CSV (description,unit_price,quantity,tax_rate).
    Totals {
        /// Path to the CSV file.
        file: PathBuf,
    },
    /// List catalog products with their GST-inclusive prices.
    Products,
    /// List clients.
    Clients,
    /// List saved quotations with their grand totals.
    Quotations {
        /// Only show quotations with this status.
        #[arg(long, value_parser = parse_status)]
        status: Option<QuotationStatus>,
    },
    /// Show one quotation with per-line tax and totals.
    Show {
        id: i64,
        /// Print as JSON instead of a text report.
        #[arg(long)]
        json: bool,
    },
    /// Create a draft quotation from catalog products.
    Create {
        /// Client id.
        #[arg(long)]
        client: i64,
        /// Product to add, as `<product_id>` or `<product_id>:<quantity>`.
        /// Repeat for more lines.
        #[arg(long = "item", required = true, value_parser = parse_item)]
        items: Vec<ItemSpec>,
        /// GST percent to use on every line instead of the catalog rate.
        #[arg(long, value_parser = parse_rate)]
        tax_rate: Option<Decimal>,
        #[command(flatten)]
        terms: TermsPatch,
    },
    /// Edit the terms or status of a saved quotation.
    Edit {
        id: i64,
        #[command(flatten)]
        terms: TermsPatch,
        #[arg(long, value_parser = parse_status)]
        status: Option<QuotationStatus>,
    },
    /// Change the status of a quotation.
    SetStatus {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: QuotationStatus,
    },
    /// Delete a quotation and its line items.
    Delete { id: i64 },
    /// Add, edit or delete a client.
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
    /// Add, edit or delete a catalog product.
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Debug, Subcommand)]
enum ClientAction {
    Add(ClientFields),
    Edit {
        id: i64,
        #[command(flatten)]
        patch: ClientPatch,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum ProductAction {
    Add(ProductFields),
    Edit {
        id: i64,
        #[command(flatten)]
        patch: ProductPatch,
    },
    Delete {
        id: i64,
    },
}

fn parse_status(s: &str) -> Result<QuotationStatus, String> {
    QuotationStatus::parse(s).ok_or_else(|| {
        let known: Vec<_> = QuotationStatus::all().iter().map(|s| s.as_str()).collect();
        format!("unknown status '{s}'; expected one of {}", known.join(", "))
    })
}

fn parse_item(s: &str) -> Result<ItemSpec, String> {
    parse_item_spec(s).map_err(|e| e.to_string())
}

fn parse_rate(s: &str) -> Result<Decimal, String> {
    parse_decimal(s).map_err(|e| e.to_string())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    let (config_path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let mut config = AppConfig::load(&config_path, required)?;
    config.apply_overrides(Overrides {
        backend: cli.backend,
        connection_string: cli.db,
        log_level: cli.log_level,
    });

    logging::set_log_level(&config.logging.level)?;
    logging::set_console_enabled(!cli.quiet)?;
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }

    if let Command::Totals { file } = &cli.command {
        let rows = csv_loader::load_from_file(file, config.quotation.default_gst_rate)
            .with_context(|| format!("failed to load line items from {}", file.display()))?;
        if rows.is_empty() {
            warn!(file = %file.display(), "no line items found");
        }
        print!("{}", TotalsReport(&rows));
        return Ok(());
    }

    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry
        .create(&db_config)
        .await
        .with_context(|| format!("failed to open database '{}'", db_config.connection_string))?;

    match cli.command {
        Command::Totals { .. } => {}
        Command::Products => {
            let products = repo.list_products().await?;
            print!("{}", ProductTable(&products));
        }
        Command::Clients => {
            let clients = repo.list_clients().await?;
            print!("{}", ClientTable(&clients));
        }
        Command::Quotations { status } => {
            let quotations = repo.list_quotations(status).await?;
            print!("{}", QuotationTable(&quotations));
        }
        Command::Show { id, json } => {
            let quotation = app::find_quotation(&*repo, id).await?;
            if json {
                println!("{}", app::quotation_json(&quotation)?);
            } else {
                print!("{}", QuotationDetail(&quotation));
            }
        }
        Command::Create {
            client,
            items,
            tax_rate,
            terms,
        } => {
            let request = CreateRequest {
                client_id: client,
                items,
                tax_rate,
                terms,
            };
            let today = chrono::Local::now().date_naive();
            let quotation =
                app::create_quotation(&*repo, &request, &config.quotation, today).await?;
            println!(
                "Created {} (id {}) for {}: {}",
                quotation.reference_id,
                quotation.id,
                quotation.client_name,
                format_inr(quotation.totals().grand_total)
            );
        }
        Command::SetStatus { id, status } => {
            repo.update_quotation_status(id, status)
                .await
                .with_context(|| format!("failed to update quotation {id}"))?;
            println!("Quotation {id} is now {status}.");
        }
        Command::Delete { id } => {
            repo.delete_quotation(id)
                .await
                .with_context(|| format!("failed to delete quotation {id}"))?;
            println!("Deleted quotation {id}.");
        }
        Command::Edit { id, terms, status } => {
            if terms.is_empty() && status.is_none() {
                anyhow::bail!("nothing to change; pass a terms flag or --status");
            }
            let quotation = records::edit_quotation(&*repo, id, &terms, status).await?;
            print!("{}", QuotationDetail(&quotation));
        }
        Command::Client { action } => match action {
            ClientAction::Add(fields) => {
                let client = records::add_client(&*repo, fields).await?;
                println!("Added client {} (id {}).", client.name, client.id);
            }
            ClientAction::Edit { id, patch } => {
                let client = records::edit_client(&*repo, id, &patch).await?;
                println!("Updated client {} (id {}).", client.name, client.id);
            }
            ClientAction::Delete { id } => {
                records::delete_client(&*repo, id).await?;
                println!("Deleted client {id}.");
            }
        },
        Command::Product { action } => match action {
            ProductAction::Add(fields) => {
                let product = records::add_product(&*repo, fields).await?;
                println!(
                    "Added product {} (id {}): {} incl. GST.",
                    product.name,
                    product.id,
                    format_inr(product.total_price())
                );
            }
            ProductAction::Edit { id, patch } => {
                let product = records::edit_product(&*repo, id, &patch).await?;
                println!(
                    "Updated product {} (id {}): {} incl. GST.",
                    product.name,
                    product.id,
                    format_inr(product.total_price())
                );
            }
            ProductAction::Delete { id } => {
                records::delete_product(&*repo, id).await?;
                println!("Deleted product {id}.");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).expect("arguments should parse").command
    }

    #[test]
    fn client_add_requires_contact_fields() {
        let ok = parse(&[
            "quote", "client", "add", "--name", "Dr. Meera Iyer", "--institution", "NIV",
            "--department", "Microbiology", "--phone", "+91 98200 11223",
        ]);
        let missing = Cli::try_parse_from(["quote", "client", "add", "--name", "Dr. Meera Iyer"]);

        match ok {
            Command::Client {
                action: ClientAction::Add(fields),
            } => {
                assert_eq!(fields.institution, "NIV");
                assert_eq!(fields.email, "");
            }
            other => panic!("expected client add, got {other:?}"),
        }
        assert!(missing.is_err());
    }

    #[test]
    fn product_edit_takes_only_changed_fields() {
        let command = parse(&["quote", "product", "edit", "3", "--price", "₹80,000"]);

        match command {
            Command::Product {
                action: ProductAction::Edit { id, patch },
            } => {
                assert_eq!(id, 3);
                assert_eq!(
                    patch,
                    ProductPatch {
                        price: Some(dec!(80000)),
                        ..ProductPatch::default()
                    }
                );
            }
            other => panic!("expected product edit, got {other:?}"),
        }
    }

    #[test]
    fn edit_and_create_accept_terms_flags() {
        let edit = parse(&[
            "quote", "edit", "5", "--warranty", "3 years onsite", "--status", "sent",
        ]);
        let create = parse(&[
            "quote", "create", "--client", "1", "--item", "1:2", "--terms-validity", "45 days",
        ]);

        match edit {
            Command::Edit { id, terms, status } => {
                assert_eq!(id, 5);
                assert_eq!(terms.warranty.as_deref(), Some("3 years onsite"));
                assert_eq!(status, Some(QuotationStatus::Sent));
            }
            other => panic!("expected edit, got {other:?}"),
        }
        match create {
            Command::Create { terms, items, .. } => {
                assert_eq!(terms.validity.as_deref(), Some("45 days"));
                assert_eq!(items[0].quantity, 2);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }
}
