use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::BackendError;
use crate::memory::{MemoryPatch, MemoryRecord, NewMemory, RecordMeta};
use crate::primer::PrimerRow;
use crate::search::RankedHit;

/// Uniform surface the Retrieval and Write cores use, regardless of which
/// SQL engine is behind it. Every implementation must honor:
///
/// - user-supplied string values are bound as parameters, never
///   interpolated into query text (table/column names may come from
///   configuration);
/// - a connection pool capped at 3 concurrent connections, 30s idle
///   timeout, 5s connect timeout;
/// - the live-record predicate `deleted_at IS NULL` (a driver may also
///   honor `superseded_by IS NULL AND contradicted IS NOT TRUE` for legacy
///   compatibility — see DESIGN.md Open Question 2).
#[async_trait]
pub trait BackendDriver: Send + Sync {
    /// Idempotent. Creates tables/indexes where the backend auto-creates
    /// schema; a no-op where schema is provisioned externally.
    async fn initialize(&self) -> Result<(), BackendError>;

    async fn ping(&self) -> bool;

    async fn close(&self);

    /// May return `Ok(vec![])` if the backend doesn't support vector search.
    async fn vector_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RankedHit>, BackendError>;

    /// Lexical/tokenized BM25-style ranking. Must not error on ordinary
    /// user strings.
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<RankedHit>, BackendError>;

    /// Substring/typo-tolerant search. Returns `Ok(vec![])` — never an
    /// error — for queries shorter than the backend's minimum n-gram
    /// length, and may return `Ok(vec![])` if unsupported.
    async fn fuzzy_search(&self, query: &str, limit: usize)
        -> Result<Vec<RankedHit>, BackendError>;

    /// Live records only.
    async fn get(&self, id: i64) -> Result<Option<MemoryRecord>, BackendError>;

    /// Recent-20-style listing used by the virtual path grammar
    /// (`shadowdb/{category}` or `shadowdb` with no category).
    async fn list_recent(
        &self,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError>;

    async fn insert_record(&self, new_memory: NewMemory) -> Result<i64, BackendError>;

    async fn update_record(&self, id: i64, patch: &MemoryPatch) -> Result<(), BackendError>;

    async fn soft_delete_record(&self, id: i64, now: DateTime<Utc>) -> Result<(), BackendError>;

    async fn restore_record(&self, id: i64) -> Result<(), BackendError>;

    /// Permanently removes rows soft-deleted before `cutoff`. Returns the
    /// number of rows removed. The only driver operation that hard-deletes.
    async fn purge_expired_records(&self, cutoff: DateTime<Utc>) -> Result<u64, BackendError>;

    async fn store_embedding(&self, id: i64, vector: &[f32]) -> Result<(), BackendError>;

    async fn get_record_meta(&self, id: i64) -> Result<Option<RecordMeta>, BackendError>;

    /// Ordered `(priority asc nulls-last, key asc)`, disabled rows
    /// excluded. Missing table/columns are not errors — return `Ok(vec![])`.
    async fn get_primer_rows(&self) -> Result<Vec<PrimerRow>, BackendError>;
}
