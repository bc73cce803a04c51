//! Corpus-Harvester main entry point
//!
//! This is the command-line interface for the corpus harvester.

use anyhow::Context;
use clap::Parser;
use corpus_harvester::config::{load_config_with_hash, Config};
use corpus_harvester::output::{load_statistics, print_statistics};
use corpus_harvester::storage::{open_storage, SharedStore};
use corpus_harvester::Driver;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Corpus-Harvester: an incremental text corpus crawler
///
/// Harvests text from local directories, the lib.ru literature archive and
/// a forum API into a corpus directory, remembering what was already fetched
/// so interrupted runs resume without downloading anything twice.
#[derive(Parser, Debug)]
#[command(name = "corpus-harvester")]
#[command(version)]
#[command(about = "An incremental text corpus crawler", long_about = None)]
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

    /// Validate config and show which crawlers would run, without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the dedup store and corpus directory, then exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(&config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_harvester=info,warn"),
            1 => EnvFilter::new("corpus_harvester=debug,info"),
            2 => EnvFilter::new("corpus_harvester=trace,debug"),
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

fn handle_dry_run(config: &Config) {
    println!("=== Corpus-Harvester Dry Run ===\n");

    println!("Driver:");
    println!("  Corpus directory: {}", config.driver.corpus_path);
    println!("  Recall interval: {}ms", config.driver.recall_interval);
    println!("  Dedup store: {}", config.storage.fetched_path);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!(
        "  Retries: {} (delay {}ms)",
        config.http.retry_count, config.http.retry_delay
    );

    println!("\nCrawlers:");
    if config.crawlers.archive {
        println!("  - archive: {}", config.archive.base_url);
        println!("    Categories: {}", config.archive.categories.len());
        println!("    Denylisted author pages: {}", config.archive.denylist.len());
        println!("    Reservation: {}", config.archive.reserv_path);
        println!("    Discovery cache: {}", config.archive.cache_path);
        println!("    Break time: {}ms", config.archive.break_time);
    }
    if config.crawlers.forum {
        println!("  - forum: {}", config.forum.listing_url);
        println!(
            "    Pages: up to {} of {} threads",
            config.forum.max_page_threshold, config.forum.page_size
        );
        println!("    Reservation: {}", config.forum.reserv_path);
        println!("    Break time: {}ms", config.forum.break_time);
    }
    if config.crawlers.filesystem {
        println!("  - filesystem: {} dir(s)", config.filesystem.dirs.len());
        for dir in &config.filesystem.dirs {
            println!("    * {}", dir);
        }
    }

    println!("\n✓ Configuration is valid");
}

fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Dedup store: {}\n", config.storage.fetched_path);

    let store = open_storage(Path::new(&config.storage.fetched_path))
        .context("failed to open dedup store")?;
    let stats = load_statistics(&store, Path::new(&config.driver.corpus_path))?;
    print_statistics(&stats);

    Ok(())
}

async fn handle_harvest(config: &Config, config_hash: String) -> anyhow::Result<()> {
    let store = open_storage(Path::new(&config.storage.fetched_path))
        .context("failed to open dedup store")?;
    let store = SharedStore::new(store);

    let mut driver = Driver::new(config, store, config_hash)?;
    let names = driver.crawler_names();
    if names.is_empty() {
        tracing::warn!("No crawler is enabled, nothing to do");
        return Ok(());
    }
    tracing::info!("Enabled crawlers: {}", names.join(", "));

    let summaries = driver.run().await?;
    let harvested: u64 = summaries.iter().map(|s| s.items_harvested).sum();
    tracing::info!("Harvest finished, {} item(s) added to the corpus", harvested);

    Ok(())
}
