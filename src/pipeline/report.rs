// src/pipeline/report.rs

//! Daily summary delivery.

use crate::error::{AppError, Result};
use crate::services::delivery::{FailureLog, MessageChannel, ParseMode};
use crate::services::report::build_report;
use crate::storage::PostingStore;

/// Failure log lines included in the summary.
pub const REPORT_FAILURE_TAIL: usize = 5;

/// Build the summary and post it as plain text. Returns the message.
pub async fn run_report(
    store: &dyn PostingStore,
    failures: &FailureLog,
    channel: &dyn MessageChannel,
) -> Result<String> {
    let unsent = store.query_unsent().await?;
    let tail = failures.tail(REPORT_FAILURE_TAIL).await?;
    let report = build_report(&unsent, &tail);

    let response = channel.post_message(&report, ParseMode::Plain).await;
    if !response.ok {
        return Err(AppError::delivery(format!(
            "report rejected (status {:?}): {}",
            response.status,
            response.body.unwrap_or_default()
        )));
    }

    log::info!("Report sent ({} unsent postings)", unsent.len());
    Ok(report)
}
