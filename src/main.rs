//! Url-Insight main entry point
//!
//! This is the command-line interface for the Url-Insight analysis engine.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url_insight::config::{load_config_with_hash, Config};
use url_insight::output::{format_report, load_statistics, print_statistics};
use url_insight::service::UrlResults;
use url_insight::storage::open_storage;
use url_insight::url::validate_address;
use url_insight::{HttpPageAnalyzer, PoolConfig, RecordStore, SqliteStorage, UrlService, WorkerPool};
use tracing_subscriber::EnvFilter;

/// Url-Insight: a concurrent URL analysis engine
///
/// Fetches each given page, records its HTML version, title, heading counts
/// and login form presence, and probes every link it contains.
#[derive(Parser, Debug)]
#[command(name = "url-insight")]
#[command(version)]
#[command(about = "A concurrent URL analysis engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Page addresses to analyze
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and URLs and show what would be analyzed
    #[arg(long, conflicts_with = "report")]
    dry_run: bool,

    /// Print the report for all stored URLs and exit
    #[arg(long, conflicts_with = "dry_run")]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.urls)
    } else if cli.report {
        handle_report(&config)
    } else {
        handle_analyze(&config, &cli.urls).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("url_insight=info,warn"),
            1 => EnvFilter::new("url_insight=debug,info"),
            2 => EnvFilter::new("url_insight=trace,debug"),
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

fn open_store(config: &Config) -> anyhow::Result<Arc<SqliteStorage>> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;
    Ok(Arc::new(storage))
}

/// Handles the --dry-run mode: validates config and URLs
fn handle_dry_run(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    println!("=== Url-Insight Dry Run ===\n");

    println!("Pool:");
    println!("  Workers: {}", config.pool.workers);
    println!("  Queue capacity: {}", config.pool.queue_capacity);
    println!("  Task timeout: {}s", config.pool.task_timeout_secs);

    println!("\nProber:");
    println!(
        "  Max concurrent probes: {}",
        config.prober.max_concurrent_probes
    );
    println!("  Probe timeout: {}s", config.prober.probe_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nURLs ({}):", urls.len());
    let mut invalid = 0;
    for address in urls {
        match validate_address(address) {
            Ok(url) => println!("  * {}", url),
            Err(e) => {
                invalid += 1;
                println!("  ! {} ({})", address, e);
            }
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would analyze {} URLs", urls.len() - invalid);
    if invalid > 0 {
        anyhow::bail!("{} invalid URLs", invalid);
    }
    Ok(())
}

/// Handles the --report mode: prints everything stored
fn handle_report(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let results = store
        .list_urls()?
        .into_iter()
        .map(|record| UrlResults::load(store.as_ref(), record.id))
        .collect::<Result<Vec<_>, _>>()?;

    print!("{}", format_report(&results));
    print_statistics(&load_statistics(store.as_ref())?);
    Ok(())
}

/// Handles the main operation: analyze every given URL and report
async fn handle_analyze(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    if urls.is_empty() {
        anyhow::bail!("no URLs given; pass at least one URL or use --report");
    }

    let store = open_store(config)?;
    let analyzer = Arc::new(
        HttpPageAnalyzer::from_config(config).context("failed to build HTTP client")?,
    );
    let pool = Arc::new(WorkerPool::new(
        store.clone(),
        analyzer,
        PoolConfig::from_settings(&config.pool),
    ));
    let service = UrlService::new(store.clone(), Arc::clone(&pool));

    pool.start()?;

    let mut ids = Vec::with_capacity(urls.len());
    for address in urls {
        match service.create(address) {
            Ok(id) => {
                service.start(id).await?;
                ids.push(id);
            }
            Err(e) => tracing::warn!("Skipping {}: {}", address, e),
        }
    }

    tracing::info!("Enqueued {} URLs, waiting for analysis", ids.len());
    pool.shutdown().await?;

    let results = ids
        .into_iter()
        .map(|id| service.results(id))
        .collect::<Result<Vec<_>, _>>()?;
    print!("{}", format_report(&results));

    let stats = pool.stats();
    tracing::info!(
        "Finished: {} done, {} failed, {} stopped, {} dropped",
        stats.done,
        stats.failed,
        stats.stopped,
        stats.dropped
    );
    Ok(())
}
