//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest catalog scraper.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, Config, DelayRange};
use catalog_harvest::crawler::{harvest, HarvestMode, HttpSource, ThreadSleeper};
use catalog_harvest::output::{print_statistics, CsvOutput};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a concurrent retail catalog scraper
///
/// Catalog-Harvest walks the category tree of a retail catalog API, pulls
/// every in-scope product page by page, looks up product details and writes
/// the results as semicolon-separated CSV tables.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent retail catalog scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without sending requests
    #[arg(long, conflicts_with = "categories_only")]
    dry_run: bool,

    /// Only fetch the category tree and write the category tables
    #[arg(long, conflicts_with = "dry_run")]
    categories_only: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    let mode = if cli.categories_only {
        HarvestMode::CategoriesOnly
    } else {
        HarvestMode::Full
    };
    handle_harvest(&config, mode)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
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
        .with_thread_names(true)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Request timeout: {}s", config.api.request_timeout);
    println!("  Headers: {}", config.api.headers.len());

    println!("\nRetry:");
    match config.retry.delay_range {
        DelayRange::Fixed(secs) => println!("  Initial delay: {}s", secs),
        DelayRange::Range([low, high]) => println!("  Initial delay: {}-{}s", low, high),
    }
    println!("  Backoff factor: {}", config.retry.backoff_factor);
    println!("  Max retries: {}", config.retry.max_retries);

    println!("\nWorkers:");
    println!("  Threads per stage: {}", config.workers.max_threads);
    println!("  Products per page: {}", config.workers.products_limit);

    println!("\nShop Context:");
    println!("  City: {}", config.context.city_id);
    println!("  Shop: {}", config.context.shop_id);
    println!("  Delivery: {}", config.context.delivery_method);

    println!("\nCategories:");
    if config.categories.include.is_empty() {
        println!("  Include: whole catalog");
    } else {
        println!("  Include ({}):", config.categories.include.len());
        for slug in &config.categories.include {
            println!("    - {}", slug);
        }
    }
    println!("  Exclude ({}):", config.categories.exclude.len());
    for slug in &config.categories.exclude {
        println!("    - {}", slug);
    }

    println!("\nRestart:");
    println!("  Attempts: {}", config.restart.count);
    println!("  Interval: {} min", config.restart.interval_minutes);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
}

/// Handles the supervised harvest
fn handle_harvest(config: &Config, mode: HarvestMode) -> anyhow::Result<ExitCode> {
    let source = HttpSource::new(&config.api).context("Failed to build HTTP client")?;
    let output = CsvOutput::new(&config.output.directory);

    tracing::info!(
        "Starting {} harvest, writing to '{}'",
        match mode {
            HarvestMode::Full => "full",
            HarvestMode::CategoriesOnly => "category-only",
        },
        output.directory().display()
    );

    let run = harvest(config, &source, &output, Arc::new(ThreadSleeper), mode);

    if let Some(stats) = &run.stats {
        print_statistics(stats);
    }
    tracing::info!("Total execution time: {:.1}s", run.elapsed.as_secs_f64());

    if run.termination.succeeded() {
        tracing::info!(
            "Harvest completed after {} attempt(s)",
            run.termination.attempts()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(
            "Harvest failed after {} attempt(s)",
            run.termination.attempts()
        );
        Ok(ExitCode::FAILURE)
    }
}
