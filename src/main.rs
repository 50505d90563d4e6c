mod loaders;
mod models;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use loaders::{CsvSource, LoadOptions, OperationTally};
use models::{City, Dataset};
use std::path::PathBuf;
use std::time::Duration;
use store::{mongo::DEFAULT_DATABASE, DocumentStore, MemoryStore, MongoStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "airbnb-loader")]
#[command(about = "Load city-scoped short-term rental CSV datasets into MongoDB")]
#[command(version)]
struct Cli {
    /// MongoDB host, e.g. `localhost:27017`
    host: String,

    /// City to load
    #[arg(value_enum, ignore_case = true)]
    city: City,

    /// Dataset to load
    #[arg(value_enum, ignore_case = true)]
    dataset: Dataset,

    /// Maximum number of attempted insertions/updates
    limit: u64,

    /// Directory with one folder of CSV files per city
    #[arg(long, default_value = "../AirBnB-Datasets")]
    data_root: PathBuf,

    /// Database to write into
    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,

    /// Seconds to wait for the server before giving up
    #[arg(long, default_value_t = 5)]
    connect_timeout_secs: u64,

    /// Also write the calendar period still open at end of input
    #[arg(long)]
    flush_trailing_period: bool,

    /// Start a new calendar period when dates skip a day
    #[arg(long)]
    split_on_date_gap: bool,

    /// Load into an in-memory store instead of MongoDB
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            data_root: self.data_root.clone(),
            flush_trailing_period: self.flush_trailing_period,
            split_on_date_gap: self.split_on_date_gap,
        }
    }
}

async fn run(cli: &Cli, store: &dyn DocumentStore) -> Result<OperationTally> {
    store
        .ping()
        .await
        .with_context(|| format!("Server not available at {}", cli.host))?;
    info!("Connected to {} store", store.backend_name());

    let options = cli.load_options();
    let path = cli.dataset.csv_path(&options.data_root, cli.city);
    let mut source = CsvSource::open(&path)?;

    let loader = loaders::loader_for(cli.dataset, cli.city, &options);
    info!("Loading {} for {} from {}", loader.dataset(), cli.city, path.display());
    let mut tally = OperationTally::with_limit(cli.limit);
    loader.load(&mut source, store, &mut tally).await?;

    Ok(tally)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    info!("🏠 Airbnb Loader - {} {}", cli.city, cli.dataset);
    info!("Limit: {} attempted insertions/updates", cli.limit);

    let tally = if cli.dry_run {
        let store = MemoryStore::new();
        let tally = run(&cli, &store).await?;
        info!(
            "Dry run left {} documents in the in-memory {} collection",
            store.count(cli.dataset),
            cli.dataset
        );
        for document in store.documents(cli.dataset).iter().take(3) {
            debug!("Sample document: {}", document);
        }
        tally
    } else {
        let timeout = Duration::from_secs(cli.connect_timeout_secs);
        let store = MongoStore::connect(&cli.host, &cli.database, timeout)
            .await
            .with_context(|| format!("Server not available at {}", cli.host))?;
        run(&cli, &store).await?
    };

    info!(
        "✅ {} succeeded, {} matched no document, {} failed",
        tally.succeeded(),
        tally.unmatched(),
        tally.failed()
    );
    println!("Number of attempted insertions/updates: {}", tally.attempted());

    Ok(())
}
