mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "koszyk-cli")]
#[command(about = "Grocery catalog scraper command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the scrape orchestrator once and print the per-store report
    Scrape {
        /// Stores to scrape (comma-separated); defaults to the catalog stores
        #[arg(long = "store", value_delimiter = ',')]
        stores: Vec<String>,

        /// Category filters (comma-separated); `all` keeps everything
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Produce a synthetic report without launching a browser
        #[arg(long)]
        synthetic: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the extractor over a saved HTML page
    Extract {
        /// Path to the saved page
        html: PathBuf,

        /// Page URL used to resolve relative image links
        #[arg(long)]
        url: Option<String>,

        /// Store whose extraction rules apply
        #[arg(long, default_value = "LIDL")]
        store: String,

        /// Seed for promotion discounts
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Render a store page in the browser and save its HTML
    Dump {
        /// Store whose scrape URL is rendered
        #[arg(long, default_value = "LIDL")]
        store: String,

        /// Render this URL instead of the store's scrape URL
        #[arg(long)]
        url: Option<String>,

        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
    /// Load the catalog through the cache-or-scrape path
    Catalog {
        /// Bypass the cache and scrape again
        #[arg(long)]
        refresh: bool,

        /// Only print records matching this term
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the fallback catalog for a store
    Fallback {
        #[arg(long, default_value = "LIDL")]
        store: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = koszyk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let stores = koszyk_core::load_stores_or_builtin(&config.stores_path)?;

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape {
            stores: selected,
            categories,
            synthetic,
            json,
        }) => {
            let request =
                commands::scrape_request(&config.catalog_stores, selected, categories, synthetic);
            commands::run_scrape(&config, &stores, &request, json).await?;
        }
        Some(Commands::Extract {
            html,
            url,
            store,
            seed,
        }) => {
            let page = std::fs::read_to_string(&html)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", html.display()))?;
            let records = commands::extract_records(
                &stores,
                &store,
                url.as_deref(),
                &page,
                seed.or(config.random_seed),
            )?;
            commands::print_json(&records)?;
        }
        Some(Commands::Dump { store, url, out }) => {
            commands::dump_page(&config, &stores, &store, url.as_deref(), &out).await?;
        }
        Some(Commands::Catalog { refresh, search }) => {
            commands::show_catalog(&config, &stores, refresh, search.as_deref()).await?;
        }
        Some(Commands::Fallback { store }) => {
            commands::print_json(&commands::fallback_records(&stores, &store))?;
        }
        None => println!("koszyk-cli ready; see --help for commands"),
    }

    Ok(())
}
