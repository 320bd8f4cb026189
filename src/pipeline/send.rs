// src/pipeline/send.rs

//! Delivery of the unsent backlog.

use crate::error::Result;
use crate::services::DeliveryEngine;
use crate::storage::PostingStore;

/// Summary of a send run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendStats {
    pub pending: usize,
    pub delivered: usize,
    pub exhausted: usize,
}

/// Deliver every unsent posting, oldest first, one at a time.
///
/// A posting is marked sent only after the engine reports delivery.
/// Exhausted postings stay unsent and are picked up by the next run.
pub async fn run_send(store: &dyn PostingStore, engine: &DeliveryEngine) -> Result<SendStats> {
    let unsent = store.query_unsent().await?;
    let mut stats = SendStats {
        pending: unsent.len(),
        ..SendStats::default()
    };
    log::info!("Sending {} unsent postings...", stats.pending);

    for posting in unsent {
        if engine.send_with_retry(&posting).await {
            store.mark_sent(&posting.id).await?;
            stats.delivered += 1;
        } else {
            stats.exhausted += 1;
        }
    }

    log::info!(
        "Send complete: {} delivered, {} remaining",
        stats.delivered,
        stats.exhausted
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::{ChannelResponse, Posting};
    use crate::services::delivery::{FailureLog, MessageChannel, ParseMode, RetryPolicy, Sleeper};
    use crate::storage::MemoryStore;

    /// Accepts every message except those mentioning `reject`.
    struct PickyChannel {
        reject: &'static str,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageChannel for PickyChannel {
        async fn post_message(&self, text: &str, _mode: ParseMode) -> ChannelResponse {
            self.sent.lock().unwrap().push(text.to_string());
            if text.contains(self.reject) {
                ChannelResponse::rejected(400, "Bad Request")
            } else {
                ChannelResponse::accepted(200, r#"{"ok":true}"#)
            }
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    #[tokio::test]
    async fn test_marks_only_delivered_postings() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::with_postings([
            Posting::new("https://site/ok", "Depto ok", "", "", ""),
            Posting::new("https://site/bad", "Depto bad", "", "", ""),
        ]);
        let channel = Arc::new(PickyChannel {
            reject: "site/bad",
            sent: Mutex::new(Vec::new()),
        });
        let engine = DeliveryEngine::new(
            channel.clone(),
            FailureLog::new(tmp.path().join("send_failures.log")),
            RetryPolicy {
                max_retries: 2,
                backoff_base: 1,
            },
        )
        .with_sleeper(Arc::new(NoSleep));

        let stats = run_send(&store, &engine).await.unwrap();
        assert_eq!(
            stats,
            SendStats {
                pending: 2,
                delivered: 1,
                exhausted: 1
            }
        );

        let unsent = store.query_unsent().await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].url, "https://site/bad");
        // one send for the good posting, primary + degraded twice for the bad one
        assert_eq!(channel.sent.lock().unwrap().len(), 5);
        assert_eq!(engine.failure_log().lines().await.unwrap().len(), 2);
    }
}
