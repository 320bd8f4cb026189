//! Outbound delivery of postings.
//!
//! Each posting goes through at most `max_retries` attempts. An attempt
//! sends the rich message first and, if the channel rejects it, a shorter
//! degraded message. Only an attempt where both sends fail is written to
//! the failure log.
//!
//! ```text
//! Pending ──primary ok──────────────▶ Delivered
//!    │
//!    └─primary fails─▶ TryDegraded ──degraded ok──▶ Delivered
//!                          │
//!                          └─degraded fails─▶ LogFailure ─┬─▶ Pending (backoff)
//!                                                         └─▶ Exhausted
//! ```

mod engine;
mod failure_log;
mod format;
mod telegram;

use async_trait::async_trait;

use crate::models::ChannelResponse;

pub use engine::{DeliveryEngine, RetryPolicy, Sleeper, TokioSleeper, backoff_delay};
pub use failure_log::{FailureLog, retry_after_hint};
pub use format::{format_degraded, format_primary};
pub use telegram::TelegramChannel;

/// How the channel should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Telegram's HTML subset
    Html,
    Plain,
}

/// A chat destination that accepts text messages.
///
/// Implementations never fail: transport errors come back as a
/// `ChannelResponse` with `ok == false` and no status.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn post_message(&self, text: &str, mode: ParseMode) -> ChannelResponse;
}
