//! Append-only JSON-lines log of failed delivery attempts.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::FailureRecord;

/// Failure log backed by a JSON-lines file.
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub async fn append(&self, record: &FailureRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// All raw lines; a missing file reads as empty.
    pub async fn lines(&self) -> Result<Vec<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// The last `n` raw lines, oldest first.
    pub async fn tail(&self, n: usize) -> Result<Vec<String>> {
        let mut lines = self.lines().await?;
        let skip = lines.len().saturating_sub(n);
        Ok(lines.split_off(skip))
    }

    /// Most recent record mentioning `id`.
    ///
    /// Lines are matched by substring before parsing, so a malformed line
    /// only matters if it is the latest match.
    pub async fn latest_for(&self, id: &str) -> Result<Option<FailureRecord>> {
        let lines = self.lines().await?;
        match lines.iter().rev().find(|l| l.contains(id)) {
            Some(line) => Ok(Some(serde_json::from_str(line)?)),
            None => Ok(None),
        }
    }
}

/// Extract a "retry after N" hint (seconds) from a response body.
///
/// Best-effort: matches Telegram's `retry after N` description text as well
/// as a `"retry_after": N` field. Absence of a hint is not an error.
pub fn retry_after_hint(body: &str) -> Option<u64> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r#"(?i)retry[ _]after"?\s*[:=]?\s*(\d+)"#).ok())
        .as_ref()?;

    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelResponse, Posting};
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(url: &str, body: &str) -> FailureRecord {
        let posting = Posting::new(url, "t", "", "", "");
        FailureRecord::new(
            &posting,
            &ChannelResponse::rejected(429, body),
            &ChannelResponse::rejected(429, body),
            Utc::now(),
        )
    }

    #[test]
    fn test_hint_from_description() {
        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 35","parameters":{"retry_after":35}}"#;
        assert_eq!(retry_after_hint(body), Some(35));
    }

    #[test]
    fn test_hint_from_parameters_only() {
        let body = r#"{"ok":false,"parameters":{"retry_after": 12}}"#;
        assert_eq!(retry_after_hint(body), Some(12));
    }

    #[test]
    fn test_hint_case_insensitive() {
        assert_eq!(retry_after_hint("Retry After 5 seconds"), Some(5));
    }

    #[test]
    fn test_no_hint() {
        assert_eq!(retry_after_hint(""), None);
        assert_eq!(
            retry_after_hint(r#"{"ok":false,"description":"Bad Request: message is too long"}"#),
            None
        );
        assert_eq!(retry_after_hint("retry after soon"), None);
    }

    #[tokio::test]
    async fn test_append_and_tail() {
        let tmp = TempDir::new().unwrap();
        let log = FailureLog::new(tmp.path().join("send_failures.log"));

        assert!(log.tail(5).await.unwrap().is_empty());

        for i in 0..7 {
            log.append(&record(&format!("https://site/{i}"), "boom"))
                .await
                .unwrap();
        }

        let tail = log.tail(5).await.unwrap();
        assert_eq!(tail.len(), 5);
        assert!(tail[0].contains("https://site/2"));
        assert!(tail[4].contains("https://site/6"));
        assert_eq!(log.lines().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_latest_for_picks_last_matching_line() {
        let tmp = TempDir::new().unwrap();
        let log = FailureLog::new(tmp.path().join("send_failures.log"));

        let first = record("https://site/a", "first");
        let id = first.id.clone();
        log.append(&first).await.unwrap();
        log.append(&record("https://site/b", "other")).await.unwrap();
        log.append(&record("https://site/a", "retry after 9")).await.unwrap();

        let latest = log.latest_for(&id).await.unwrap().unwrap();
        assert_eq!(latest.body_primary.as_deref(), Some("retry after 9"));
        assert!(log.latest_for("0000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_each_record_is_one_line() {
        let tmp = TempDir::new().unwrap();
        let log = FailureLog::new(tmp.path().join("send_failures.log"));
        log.append(&record("https://site/a", "multi\nline\nbody"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().count(), 1);
    }
}
