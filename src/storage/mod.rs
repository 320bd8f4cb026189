//! Storage abstractions for posting persistence.
//!
//! Every component receives a `&dyn PostingStore`; nothing opens its own
//! handle. Records are keyed by their content-address `id` for lookups and
//! by the store-assigned `seq` for updates, since reconciliation may rewrite
//! the id itself.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: process-local, used by tests and dry runs
//! - [`JsonFileStore`]: a single JSON document, rewritten atomically

pub mod local;
pub mod memory;
mod records;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Posting;

// Re-export for convenience
pub use local::JsonFileStore;
pub use memory::MemoryStore;
pub use records::Records;

/// Trait for posting storage backends.
///
/// A single call is atomic. `update_many` is all-or-nothing: if any record
/// is missing or the result would leave two records with the same id,
/// nothing is written.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Insert a posting unless its id is already stored.
    ///
    /// Assigns `seq`. Returns `false` when the id was already present.
    async fn insert_if_absent(&self, posting: Posting) -> Result<bool>;

    /// Look up a posting by id.
    async fn get_by_id(&self, id: &str) -> Result<Option<Posting>>;

    /// Look up several postings by id, in store order. Unknown ids are skipped.
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Posting>>;

    /// Flag a posting as sent. Returns `false` when the id is unknown.
    async fn mark_sent(&self, id: &str) -> Result<bool>;

    /// All unsent postings, in insertion order.
    async fn query_unsent(&self) -> Result<Vec<Posting>>;

    /// All postings, in insertion order.
    async fn query_all(&self) -> Result<Vec<Posting>>;

    /// Replace several records (located by `seq`) in one atomic write.
    async fn update_many(&self, postings: Vec<Posting>) -> Result<()>;

    /// Replace one record, located by `seq`.
    async fn update(&self, posting: Posting) -> Result<()> {
        self.update_many(vec![posting]).await
    }

    /// Whether a posting with this id is stored.
    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}
