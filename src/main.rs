//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product scraper.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, validate, CategoryEntry, Config};
use catalog_harvest::crawler::run_harvest;
use catalog_harvest::output::print_summary;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: an industrial product catalog scraper
///
/// Catalog-Harvest walks the vendor catalog, extracts one normalized record
/// per product, downloads images, manuals and drawings, and writes the
/// records as JSON files.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
#[command(about = "An industrial product catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory for JSON records and assets
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum number of products to harvest
    #[arg(short, long, value_name = "N")]
    limit: Option<u32>,

    /// Only harvest these category ids (repeatable)
    #[arg(short, long = "category", value_name = "ID")]
    categories: Vec<u32>,

    /// Skip image, manual and drawing downloads
    #[arg(long)]
    no_assets: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line flags on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }

    if let Some(limit) = cli.limit {
        config.crawler.max_products = Some(limit);
    }

    if !cli.categories.is_empty() {
        let named = std::mem::take(&mut config.crawler.categories);
        let mut seen = std::collections::HashSet::new();
        config.crawler.categories = cli
            .categories
            .iter()
            .filter(|&&id| seen.insert(id))
            .map(|&id| CategoryEntry {
                id,
                name: named
                    .iter()
                    .find(|entry| entry.id == id)
                    .and_then(|entry| entry.name.clone()),
            })
            .collect();
    }

    if cli.no_assets {
        config.output.download_assets = false;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Catalog: {}{}", config.site.base_url, config.site.catalog_path);
    println!("  Listing API: {}{}", config.site.base_url, config.site.api_path);
    println!("  Language: {}", config.site.language);
    println!(
        "  Default brand: {}",
        config.site.brand.as_deref().unwrap_or("(none)")
    );

    println!("\nCrawler:");
    println!("  Page size: {}", config.crawler.page_size);
    println!(
        "  Max pages per category: {}",
        config.crawler.max_pages_per_category
    );
    match config.crawler.max_products {
        Some(max) => println!("  Max products: {}", max),
        None => println!("  Max products: unlimited"),
    }

    if config.crawler.categories.is_empty() {
        println!("\nCategories: discovered from the catalog page");
    } else {
        println!("\nCategories ({}):", config.crawler.categories.len());
        for entry in &config.crawler.categories {
            println!(
                "  - {} {}",
                entry.id,
                entry.name.as_deref().unwrap_or("")
            );
        }
    }

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.http.max_retries, config.http.retry_backoff_ms
    );
    println!(
        "  Min request interval: {}ms",
        config.http.min_request_interval_ms
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Download assets: {}", config.output.download_assets);

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} into {}",
        config.site.base_url,
        config.output.directory
    );

    let summary = run_harvest(config).await.context("Harvest aborted")?;
    print_summary(&summary);

    if summary.products_failed() > 0 {
        tracing::warn!(
            "{} products were skipped, see the summary above",
            summary.products_failed()
        );
    }

    Ok(())
}
