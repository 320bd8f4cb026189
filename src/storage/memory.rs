//! Process-local storage backend.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::Posting;
use crate::storage::{PostingStore, Records};

/// Posting store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Records::new()),
        }
    }

    /// Build a store pre-populated with postings, as if inserted in order.
    ///
    /// Ids and `sent` flags are kept as given, so legacy (pre-normalization)
    /// records can be reproduced.
    pub fn with_postings(postings: impl IntoIterator<Item = Posting>) -> Self {
        let mut records = Records::new();
        for posting in postings {
            records.insert_if_absent(posting);
        }
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl PostingStore for MemoryStore {
    async fn insert_if_absent(&self, posting: Posting) -> Result<bool> {
        Ok(self.records.lock().await.insert_if_absent(posting))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Posting>> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Posting>> {
        Ok(self.records.lock().await.by_ids(ids))
    }

    async fn mark_sent(&self, id: &str) -> Result<bool> {
        Ok(self.records.lock().await.mark_sent(id))
    }

    async fn query_unsent(&self) -> Result<Vec<Posting>> {
        Ok(self.records.lock().await.unsent())
    }

    async fn query_all(&self) -> Result<Vec<Posting>> {
        Ok(self.records.lock().await.postings.clone())
    }

    async fn update_many(&self, postings: Vec<Posting>) -> Result<()> {
        self.records.lock().await.apply(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(url: &str) -> Posting {
        Posting::new(url, "title", "$ 1", "loc", "desc")
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = MemoryStore::new();
        let p = posting("https://site/a");
        let id = p.id.clone();

        assert!(store.insert_if_absent(p.clone()).await.unwrap());
        assert!(!store.insert_if_absent(p).await.unwrap());
        assert!(store.exists(&id).await.unwrap());
        assert_eq!(store.get_by_id(&id).await.unwrap().unwrap().seq, 1);
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_sent_removes_from_unsent() {
        let store = MemoryStore::new();
        let a = posting("https://site/a");
        let b = posting("https://site/b");
        let a_id = a.id.clone();
        store.insert_if_absent(a).await.unwrap();
        store.insert_if_absent(b).await.unwrap();

        assert!(store.mark_sent(&a_id).await.unwrap());
        assert!(!store.mark_sent("missing").await.unwrap());

        let unsent = store.query_unsent().await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].url, "https://site/b");
        assert_eq!(store.query_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_ids_in_store_order() {
        let store = MemoryStore::new();
        let ids: Vec<String> = ["https://site/a", "https://site/b", "https://site/c"]
            .into_iter()
            .map(posting)
            .map(|p| {
                let id = p.id.clone();
                store.records.try_lock().unwrap().insert_if_absent(p);
                id
            })
            .collect();

        let wanted = vec![ids[2].clone(), ids[0].clone(), "missing".to_string()];
        let found = store.get_by_ids(&wanted).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, ids[0]);
        assert_eq!(found[1].id, ids[2]);
    }

    #[tokio::test]
    async fn test_update_rewrites_id_by_seq() {
        let store = MemoryStore::new();
        store.insert_if_absent(posting("https://site/a")).await.unwrap();

        let mut p = store.query_all().await.unwrap().remove(0);
        p.id = "legacy".to_string();
        store.update(p).await.unwrap();

        assert!(store.exists("legacy").await.unwrap());
        assert_eq!(store.query_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_with_postings_keeps_legacy_ids() {
        let mut legacy = posting("https://site/a?page=2");
        legacy.id = "legacy-id".to_string();
        legacy.sent = true;

        let store = MemoryStore::with_postings(vec![legacy, posting("https://site/a")]);
        let all = store.query_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].seq, 1);
        assert_eq!(all[0].id, "legacy-id");
        assert!(all[0].sent);
        assert_eq!(all[1].seq, 2);
    }
}
