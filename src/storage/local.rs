//! Local filesystem storage implementation.
//!
//! All postings live in one JSON document:
//!
//! ```text
//! {
//!   "next_seq": 42,
//!   "postings": [ { "seq": 1, "id": "…", "url": "…", "sent": true, … }, … ]
//! }
//! ```
//!
//! Every mutation is applied to a copy of the records, the copy is written
//! to a temp file and renamed over the document, and only then does it
//! replace the in-memory state. A failed write therefore leaves both the
//! file and the store untouched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Posting;
use crate::storage::{PostingStore, Records};

/// File-backed posting store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Records>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file doesn't exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match Self::read_records(&path).await? {
            Some(mut records) => {
                records.normalize_sequences();
                log::info!(
                    "Loaded {} postings from {}",
                    records.postings.len(),
                    path.display()
                );
                records
            }
            None => {
                log::warn!("No store found at {}, starting empty", path.display());
                Records::new()
            }
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read records, returning None if the file doesn't exist.
    async fn read_records(path: &Path) -> Result<Option<Records>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Run `change` against a copy of the records and persist the copy
    /// if it differs from the current state.
    async fn mutate<T>(&self, change: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        let mut guard = self.records.lock().await;
        let mut next = guard.clone();
        let value = change(&mut next)?;

        if next != *guard {
            let bytes = serde_json::to_vec_pretty(&next)?;
            self.write_bytes(&bytes).await?;
            *guard = next;
        }
        Ok(value)
    }
}

#[async_trait]
impl PostingStore for JsonFileStore {
    async fn insert_if_absent(&self, posting: Posting) -> Result<bool> {
        self.mutate(|records| Ok(records.insert_if_absent(posting)))
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Posting>> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Posting>> {
        Ok(self.records.lock().await.by_ids(ids))
    }

    async fn mark_sent(&self, id: &str) -> Result<bool> {
        self.mutate(|records| Ok(records.mark_sent(id))).await
    }

    async fn query_unsent(&self) -> Result<Vec<Posting>> {
        Ok(self.records.lock().await.unsent())
    }

    async fn query_all(&self) -> Result<Vec<Posting>> {
        Ok(self.records.lock().await.postings.clone())
    }

    async fn update_many(&self, postings: Vec<Posting>) -> Result<()> {
        self.mutate(|records| records.apply(postings)).await
    }
}
