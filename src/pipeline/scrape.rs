// src/pipeline/scrape.rs

//! Listing scrape pipeline.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{Config, SourceConfig};
use crate::services::sources::{collect_new, parser_for};
use crate::storage::PostingStore;
use crate::utils::http::fetch_page;

/// Summary of a scrape run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeStats {
    pub sources: usize,
    pub failed_sources: usize,
    pub inserted: usize,
}

/// Fetch every configured source and store the postings not seen before.
///
/// Pages are fetched concurrently, bounded by `crawler.max_concurrent`;
/// extraction and inserts then run source by source in config order. A
/// source that fails to fetch or ingest is logged and skipped.
pub async fn run_scrape(
    config: &Config,
    store: &dyn PostingStore,
    client: &reqwest::Client,
) -> Result<ScrapeStats> {
    if config.sources.is_empty() {
        log::warn!("No sources configured; nothing to scrape");
        return Ok(ScrapeStats::default());
    }

    log::info!("Scraping {} sources...", config.sources.len());
    let pages = fetch_pages(config, client).await;
    ingest_pages(store, pages).await
}

async fn fetch_pages(
    config: &Config,
    client: &reqwest::Client,
) -> Vec<(SourceConfig, Result<String>)> {
    let delay = Duration::from_millis(config.crawler.request_delay_ms);
    let concurrency = config.crawler.max_concurrent.max(1);

    let mut pages = Vec::with_capacity(config.sources.len());
    let mut page_stream = stream::iter(config.sources.iter().cloned())
        .map(|source| async move {
            let result = fetch_page(client, &source.url)
                .await
                .map_err(|e| AppError::scrape(source.kind.label(), e));
            (source, result)
        })
        .buffered(concurrency);

    while let Some(page) = page_stream.next().await {
        pages.push(page);

        if delay.as_millis() > 0 {
            tokio::time::sleep(delay).await;
        }
    }
    pages
}

/// Extract and store postings from already fetched pages, in order.
pub async fn ingest_pages(
    store: &dyn PostingStore,
    pages: Vec<(SourceConfig, Result<String>)>,
) -> Result<ScrapeStats> {
    let mut stats = ScrapeStats {
        sources: pages.len(),
        ..ScrapeStats::default()
    };

    for (source, page) in pages {
        let outcome = match page {
            Ok(html) => ingest_page(store, &source, &html).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(inserted) => {
                log::info!("{}: {} new postings", source.kind, inserted);
                stats.inserted += inserted;
            }
            Err(e) => {
                log::warn!("Failed to scrape {} ({}): {}", source.kind, source.url, e);
                stats.failed_sources += 1;
            }
        }
    }

    log::info!(
        "Scrape complete: {} new postings from {} sources ({} failed)",
        stats.inserted,
        stats.sources,
        stats.failed_sources
    );
    Ok(stats)
}

async fn ingest_page(store: &dyn PostingStore, source: &SourceConfig, html: &str) -> Result<usize> {
    let parser = parser_for(source.kind)?;
    let fresh = collect_new(parser.as_ref(), html, store).await?;

    let mut inserted = 0;
    for posting in fresh {
        if store.insert_if_absent(posting).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}
