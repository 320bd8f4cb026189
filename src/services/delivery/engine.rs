//! Retrying delivery of a single posting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{ChannelResponse, DeliveryConfig, FailureRecord, Posting};

use super::failure_log::{FailureLog, retry_after_hint};
use super::format::{format_degraded, format_primary};
use super::{MessageChannel, ParseMode};

/// Seconds added on top of a channel's retry-after hint.
pub const RATE_LIMIT_GRACE_SECS: u64 = 2;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Seconds
    pub backoff_base: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DeliveryConfig::default())
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: config.retry_backoff_base,
        }
    }
}

/// Wait before the next attempt after `attempt` (1-indexed) failed.
///
/// A rate-limit hint wins over the exponential schedule.
pub fn backoff_delay(attempt: u32, backoff_base: u64, hint: Option<u64>) -> Duration {
    let secs = match hint {
        Some(retry_after) => retry_after.saturating_add(RATE_LIMIT_GRACE_SECS),
        None => {
            let exponent = attempt.saturating_sub(1).min(63);
            backoff_base.saturating_mul(1u64 << exponent)
        }
    };
    Duration::from_secs(secs)
}

/// Suspension point between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sends postings to a channel with fallback, retries and failure logging.
///
/// The engine never touches the posting store; marking a posting as sent
/// is up to the caller once `send_with_retry` returns `true`.
pub struct DeliveryEngine {
    channel: Arc<dyn MessageChannel>,
    failures: FailureLog,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl DeliveryEngine {
    pub fn new(channel: Arc<dyn MessageChannel>, failures: FailureLog, policy: RetryPolicy) -> Self {
        Self {
            channel,
            failures,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the timer used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn failure_log(&self) -> &FailureLog {
        &self.failures
    }

    /// One attempt: the primary message, then the degraded one.
    ///
    /// Appends exactly one failure record when both sends are rejected.
    pub async fn attempt_delivery(&self, posting: &Posting) -> bool {
        let primary = self
            .channel
            .post_message(&format_primary(posting), ParseMode::Html)
            .await;
        if primary.ok {
            log::debug!("Delivered {} (primary)", posting.id);
            return true;
        }
        log::debug!(
            "Primary send rejected for {} (status {:?}), trying degraded message",
            posting.id,
            primary.status
        );

        let degraded = self
            .channel
            .post_message(&format_degraded(posting), ParseMode::Html)
            .await;
        if degraded.ok {
            log::info!("Delivered {} with degraded message", posting.id);
            return true;
        }

        self.record_failure(posting, &primary, &degraded).await;
        false
    }

    /// Up to `max_retries` attempts with backoff between failures.
    ///
    /// Returns `false` once every attempt failed (exhausted).
    pub async fn send_with_retry(&self, posting: &Posting) -> bool {
        let max_retries = self.policy.max_retries;

        for attempt in 1..=max_retries {
            if self.attempt_delivery(posting).await {
                return true;
            }
            if attempt == max_retries {
                break;
            }

            let hint = self.latest_hint(&posting.id).await;
            let delay = backoff_delay(attempt, self.policy.backoff_base, hint);
            log::warn!(
                "Attempt {attempt}/{max_retries} failed for {}; sleeping {}s before retrying",
                posting.id,
                delay.as_secs()
            );
            self.sleeper.sleep(delay).await;
        }

        log::error!(
            "Giving up on {} ({}) after {max_retries} attempts",
            posting.id,
            posting.url
        );
        false
    }

    async fn record_failure(
        &self,
        posting: &Posting,
        primary: &ChannelResponse,
        degraded: &ChannelResponse,
    ) {
        let record = FailureRecord::new(posting, primary, degraded, Utc::now());
        if let Err(e) = self.failures.append(&record).await {
            log::error!(
                "Could not write failure record for {} to {}: {e}",
                posting.id,
                self.failures.path().display()
            );
        }
    }

    /// Retry-after hint from the latest logged failure for `id`.
    async fn latest_hint(&self, id: &str) -> Option<u64> {
        match self.failures.latest_for(id).await {
            Ok(record) => record?.bodies().find_map(retry_after_hint),
            Err(e) => {
                log::warn!("Could not read failure log for {id}: {e}");
                None
            }
        }
    }
}
