// src/pipeline/pipeline.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::DeliveryEngine;
use crate::storage::PostingStore;

use super::scrape::{ScrapeStats, run_scrape};
use super::send::{SendStats, run_send};

/// Outcome of a full scrape-then-send run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub scrape: ScrapeStats,
    pub send: SendStats,
}

/// Run the full pipeline: scrape every source, then deliver the backlog.
pub async fn run_pipeline(
    config: &Config,
    store: &dyn PostingStore,
    client: &reqwest::Client,
    engine: &DeliveryEngine,
) -> Result<PipelineStats> {
    log::info!("Step 1/2: Scraping sources...");
    let scrape = run_scrape(config, store, client).await?;

    log::info!("Step 2/2: Delivering unsent postings...");
    let send = run_send(store, engine).await?;

    log::info!("Pipeline complete!");
    Ok(PipelineStats { scrape, send })
}
