//! Delivery failure record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Posting;
use crate::utils::truncate_chars;

/// Maximum characters kept from each response body.
pub const MAX_BODY_CHARS: usize = 1000;

/// What the channel answered to a single send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelResponse {
    /// Whether the message was accepted
    pub ok: bool,
    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,
    /// Response body, or the transport error text
    pub body: Option<String>,
}

impl ChannelResponse {
    pub fn accepted(status: u16, body: impl Into<String>) -> Self {
        Self {
            ok: true,
            status: Some(status),
            body: Some(body.into()),
        }
    }

    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: Some(status),
            body: Some(body.into()),
        }
    }

    /// No response at all (timeout, connection refused, ...).
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: None,
            body: Some(reason.into()),
        }
    }
}

/// One line of the append-only delivery failure log.
///
/// Written once per failed delivery attempt, covering both the primary and
/// the degraded send of that attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    /// ISO-8601 UTC
    pub timestamp: String,
    pub id: String,
    pub url: String,
    pub status_primary: Option<u16>,
    pub status_degraded: Option<u16>,
    pub body_primary: Option<String>,
    pub body_degraded: Option<String>,
}

impl FailureRecord {
    pub fn new(
        posting: &Posting,
        primary: &ChannelResponse,
        degraded: &ChannelResponse,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
            id: posting.id.clone(),
            url: posting.url.clone(),
            status_primary: primary.status,
            status_degraded: degraded.status,
            body_primary: primary.body.as_deref().map(|b| truncate_chars(b, MAX_BODY_CHARS)),
            body_degraded: degraded
                .body
                .as_deref()
                .map(|b| truncate_chars(b, MAX_BODY_CHARS)),
        }
    }

    /// Response bodies in the order they were produced.
    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.body_primary
            .as_deref()
            .into_iter()
            .chain(self.body_degraded.as_deref())
    }
}
