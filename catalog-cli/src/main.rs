use catalog::query::{DEFAULT_LIMIT, DEFAULT_PAGE};
use catalog::{CatalogDb, CatalogError, CatalogStore, IngestionPipeline, QueryEngine, SearchParams};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

/// Catalog CLI: ingest product CSV batches and query the stored catalog
#[derive(Parser)]
#[command(name = "catalog-cli", version, about)]
struct Cli {
    /// Path to the catalog database (created if missing)
    #[arg(long, default_value = "catalog.db")]
    db: PathBuf,

    /// Output format
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a CSV file and upsert its valid rows
    Ingest {
        /// Path to a .csv file
        file: PathBuf,
    },

    /// List products in id order
    List {
        #[arg(long, default_value_t = DEFAULT_PAGE, allow_negative_numbers = true)]
        page: i64,
        /// Items per page (clamped to 1..=100)
        #[arg(long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Search products by brand, color and price range
    Search {
        /// Case-insensitive substring of the brand
        #[arg(long)]
        brand: Option<String>,
        /// Case-insensitive substring of the color
        #[arg(long)]
        color: Option<String>,
        /// Inclusive lower price bound
        #[arg(long)]
        min_price: Option<f64>,
        /// Inclusive upper price bound
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_PAGE, allow_negative_numbers = true)]
        page: i64,
        #[arg(long, default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Show a single product by SKU
    Get {
        sku: String,
    },

    /// Show database location and product count
    Status,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("Opening catalog at {}", cli.db.display());
    let db = CatalogDb::open(&cli.db)?;

    match cli.command {
        Command::Ingest { file } => {
            let result = IngestionPipeline::new(&db).ingest_file(&file)?;
            print_output(
                &serde_json::json!({
                    "message": result.summary(),
                    "total_rows": result.total_rows,
                    "valid_rows": result.valid_rows,
                    "invalid_rows": result.invalid_rows,
                    "errors": result.errors,
                }),
                &cli.format,
            )?;
        }

        Command::List { page, limit } => {
            let page = QueryEngine::new(&db).list_page(page, limit)?;
            print_output(&page, &cli.format)?;
        }

        Command::Search {
            brand,
            color,
            min_price,
            max_price,
            page,
            limit,
        } => {
            let params = SearchParams {
                brand,
                color,
                min_price,
                max_price,
            };
            let page = QueryEngine::new(&db).search_page(&params, page, limit)?;
            print_output(&page, &cli.format)?;
        }

        Command::Get { sku } => {
            let product = db
                .get(&sku)?
                .ok_or(CatalogError::NotFound { sku })?;
            print_output(&product, &cli.format)?;
        }

        Command::Status => {
            print_output(&db.status()?, &cli.format)?;
        }
    }

    Ok(())
}

fn print_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
