//! Posting Bot CLI
//!
//! Each subcommand is one batch routine; schedule them with cron.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use posting_bot::{
    error::Result,
    models::Config,
    pipeline,
    services::delivery::{DeliveryEngine, FailureLog, RetryPolicy, TelegramChannel},
    storage::{JsonFileStore, PostingStore},
    utils::http,
};

/// Posting Bot - Real-estate listing relay
#[derive(Parser, Debug)]
#[command(
    name = "posting-bot",
    version,
    about = "Scrapes real-estate listings and relays new postings to Telegram"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape configured sources and store new postings
    Scrape,

    /// Deliver unsent postings with retries
    Send,

    /// Run full pipeline: Scrape → Send
    Run,

    /// Recompute ids of unsent postings under the current normalization
    Normalize,

    /// Collapse stored postings that share a canonical id
    Dedupe,

    /// Send the daily backlog summary
    Report,

    /// Validate the configuration file
    Validate,

    /// Show store and failure log info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn delivery_engine(config: &Config) -> Result<DeliveryEngine> {
    let channel = TelegramChannel::new(&config.telegram)?;
    Ok(DeliveryEngine::new(
        Arc::new(channel),
        FailureLog::new(&config.paths.failure_log),
        RetryPolicy::from(&config.delivery),
    ))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Posting Bot starting...");

    let config = Config::load_or_default(&cli.config).inspect_err(|e| {
        log::error!("Cannot load configuration from {}: {}", cli.config.display(), e);
    })?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Scrape => {
            config.validate()?;
            let store = JsonFileStore::open(&config.paths.store_file).await?;
            let client = http::create_async_client(&config.crawler)?;
            let stats = pipeline::run_scrape(&config, &store, &client).await?;

            log::info!(
                "Stored {} new postings ({} of {} sources failed)",
                stats.inserted,
                stats.failed_sources,
                stats.sources
            );
        }

        Command::Send => {
            config.validate_delivery()?;
            let store = JsonFileStore::open(&config.paths.store_file).await?;
            let engine = delivery_engine(&config)?;
            let stats = pipeline::run_send(&store, &engine).await?;

            log::info!(
                "Delivered {} of {} postings",
                stats.delivered,
                stats.pending
            );
        }

        Command::Run => {
            config.validate_delivery()?;
            let store = JsonFileStore::open(&config.paths.store_file).await?;
            let client = http::create_async_client(&config.crawler)?;
            let engine = delivery_engine(&config)?;
            let stats = pipeline::run_pipeline(&config, &store, &client, &engine).await?;

            log::info!(
                "Stored {} new postings, delivered {} of {}",
                stats.scrape.inserted,
                stats.send.delivered,
                stats.send.pending
            );
        }

        Command::Normalize => {
            let store = JsonFileStore::open(&config.paths.store_file).await?;
            let report = pipeline::run_normalize(&store).await?;

            log::info!(
                "Updated: {}, deduped: {}, failed: {}",
                report.updated,
                report.deduped,
                report.failed
            );
        }

        Command::Dedupe => {
            let store = JsonFileStore::open(&config.paths.store_file).await?;
            let report = pipeline::run_merge(&store).await?;

            log::info!(
                "Groups: {}, marked sent: {}, keepers rewritten: {}, failed groups: {}",
                report.groups,
                report.marked,
                report.keepers_rewritten,
                report.failed_groups
            );
        }

        Command::Report => {
            config.validate_delivery()?;
            let store = JsonFileStore::open(&config.paths.store_file).await?;
            let failures = FailureLog::new(&config.paths.failure_log);
            let channel = TelegramChannel::new(&config.telegram)?;
            let report = pipeline::run_report(&store, &failures, &channel).await?;

            log::debug!("Report:\n{report}");
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} sources)", config.sources.len());

            match config.validate_delivery() {
                Ok(()) => log::info!("✓ Telegram settings OK"),
                Err(e) => log::warn!("Delivery commands will fail: {}", e),
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            for source in &config.sources {
                log::info!("Source {}: {}", source.kind, source.url);
            }

            let store_path = &config.paths.store_file;
            if store_path.exists() {
                let store = JsonFileStore::open(store_path).await?;
                let total = store.query_all().await?.len();
                let unsent = store.query_unsent().await?.len();
                log::info!(
                    "Store {}: {} postings, {} unsent",
                    store_path.display(),
                    total,
                    unsent
                );
            } else {
                log::info!("No store found at {}", store_path.display());
            }

            let failures = FailureLog::new(&config.paths.failure_log);
            log::info!(
                "Failure log {}: {} records",
                failures.path().display(),
                failures.lines().await?.len()
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
