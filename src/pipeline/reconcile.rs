// src/pipeline/reconcile.rs

//! Store reconciliation entry points.

use crate::error::Result;
use crate::services::reconcile::{MergeReport, NormalizeReport, merge_duplicates, normalize_ids};
use crate::storage::PostingStore;

/// Rewrite legacy ids of unsent postings (`normalize` command).
pub async fn run_normalize(store: &dyn PostingStore) -> Result<NormalizeReport> {
    log::info!("Normalizing ids of unsent postings...");
    normalize_ids(store).await
}

/// Collapse postings sharing a canonical id (`dedupe` command).
pub async fn run_merge(store: &dyn PostingStore) -> Result<MergeReport> {
    log::info!("Merging duplicate postings...");
    merge_duplicates(store).await
}
