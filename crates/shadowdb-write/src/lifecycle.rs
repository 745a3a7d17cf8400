//! `WriteLifecycle`: the `write`/`update`/`delete`/`undelete`/retention-purge
//! state machine. Live ⇄ (delete) SoftDeleted ⇄ (undelete) Live; SoftDeleted
//! → Purged (terminal, absent) only via `run_retention_purge`.

use chrono::Utc;
use tracing::{info, warn};

use shadowdb_core::constants::DEFAULT_RECORD_TYPE;
use shadowdb_core::errors::{BackendError, WriteError};
use shadowdb_core::memory::{MemoryPatch, NewMemory};
use shadowdb_core::search::virtual_path;
use shadowdb_core::traits::{BackendDriver, EmbeddingProvider};
use shadowdb_core::write_result::WriteResult;

use crate::sanitize::{sanitize_category, sanitize_tags, sanitize_title, validate_content};

#[derive(Debug, thiserror::Error)]
pub enum WriteOpError {
    #[error(transparent)]
    Invalid(#[from] WriteError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct NewMemoryInput<'a> {
    pub content: &'a str,
    pub category: Option<&'a str>,
    pub title: Option<&'a str>,
    pub tags: &'a [String],
}

pub struct MemoryPatchInput<'a> {
    pub content: Option<&'a str>,
    pub title: Option<&'a str>,
    pub category: Option<&'a str>,
    pub tags: Option<&'a [String]>,
}

pub struct WriteLifecycle<'a> {
    backend: &'a dyn BackendDriver,
    embedder: &'a dyn EmbeddingProvider,
    auto_embed: bool,
    purge_after_days: i64,
    table: String,
}

impl<'a> WriteLifecycle<'a> {
    pub fn new(
        backend: &'a dyn BackendDriver,
        embedder: &'a dyn EmbeddingProvider,
        auto_embed: bool,
        purge_after_days: i64,
        table: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            embedder,
            auto_embed,
            purge_after_days,
            table: table.into(),
        }
    }

    pub async fn write(&self, input: NewMemoryInput<'_>) -> Result<WriteResult, WriteOpError> {
        let content = validate_content(input.content)?;
        let category = sanitize_category(input.category);
        let title = sanitize_title(input.title);
        let tags = sanitize_tags(input.tags);

        let id = self
            .backend
            .insert_record(NewMemory {
                content: content.clone(),
                title,
                category: category.clone(),
                record_type: DEFAULT_RECORD_TYPE.to_string(),
                tags,
            })
            .await?;

        let embedded = if self.auto_embed {
            Some(self.try_embed_and_store(id, &content).await)
        } else {
            None
        };

        Ok(WriteResult::success(
            id,
            virtual_path(&category, id),
            embedded,
            "record created",
        ))
    }

    pub async fn update(&self, id: i64, patch: MemoryPatchInput<'_>) -> Result<WriteResult, WriteOpError> {
        let meta = self
            .backend
            .get_record_meta(id)
            .await?
            .ok_or(WriteError::NotFound { id })?;
        if meta.is_deleted {
            return Err(WriteError::Deleted { id }.into());
        }

        let content = patch.content.map(validate_content).transpose()?;
        let category = patch.category.map(|c| sanitize_category(Some(c)));
        let title = patch.title.map(|t| sanitize_title(Some(t))).unwrap_or(None);
        let tags = patch.tags.map(sanitize_tags);

        let built = MemoryPatch {
            content: content.clone(),
            title,
            category,
            tags,
        };
        if built.is_empty() {
            return Err(WriteError::NothingToUpdate.into());
        }

        self.backend.update_record(id, &built).await?;

        let embedded = if self.auto_embed {
            match &content {
                Some(new_content) => Some(self.try_embed_and_store(id, new_content).await),
                None => None,
            }
        } else {
            None
        };

        let category_for_path = match category {
            Some(c) => c,
            None => self.backend.get(id).await?.map(|r| r.category).ok_or(WriteError::NotFound { id })?,
        };
        Ok(WriteResult::success(
            id,
            virtual_path(&category_for_path, id),
            embedded,
            "record updated",
        ))
    }

    pub async fn delete(&self, id: i64) -> Result<WriteResult, WriteOpError> {
        let meta = self
            .backend
            .get_record_meta(id)
            .await?
            .ok_or(WriteError::NotFound { id })?;
        if meta.is_deleted {
            return Ok(WriteResult::idempotent(id, "already deleted"));
        }

        self.backend.soft_delete_record(id, Utc::now()).await?;
        Ok(WriteResult::idempotent(
            id,
            format!(
                "soft-deleted; purged after {} days unless restored",
                self.purge_after_days
            ),
        ))
    }

    pub async fn undelete(&self, id: i64) -> Result<WriteResult, WriteOpError> {
        let meta = self
            .backend
            .get_record_meta(id)
            .await?
            .ok_or(WriteError::NotFound { id })?;
        if !meta.is_deleted {
            return Ok(WriteResult::idempotent(id, "already live"));
        }

        self.backend.restore_record(id).await?;
        Ok(WriteResult::idempotent(id, "restored"))
    }

    /// The only path that permanently removes rows. Returns the count
    /// purged.
    pub async fn run_retention_purge(&self) -> Result<u64, BackendError> {
        if self.purge_after_days <= 0 {
            return Ok(0);
        }
        let cutoff = Utc::now() - chrono::Duration::days(self.purge_after_days);
        let purged = self.backend.purge_expired_records(cutoff).await?;
        info!(purged, table = %self.table, "retention purge complete");
        Ok(purged)
    }

    /// Fail-open: embedding failures are logged and reported as
    /// `embedded=false`, never propagated.
    async fn try_embed_and_store(&self, id: i64, content: &str) -> bool {
        match self.embedder.embed(content).await {
            Ok(vector) => match self.backend.store_embedding(id, &vector).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(id, error = %e, "failed to store embedding, continuing without it");
                    false
                }
            },
            Err(e) => {
                warn!(id, error = %e, label = %self.embedder.label(), "embedding failed, continuing without it");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shadowdb_core::errors::EmbeddingError;
    use shadowdb_core::memory::{MemoryRecord, RecordMeta};
    use shadowdb_core::primer::PrimerRow;
    use shadowdb_core::search::RankedHit;
    use std::sync::Mutex;

    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.vector.clone())
        }
        fn dimensions(&self) -> usize {
            self.vector.len()
        }
        fn label(&self) -> String {
            "stub:stub".to_string()
        }
    }

    #[derive(Default)]
    struct InMemoryBackend {
        records: Mutex<std::collections::HashMap<i64, MemoryRecord>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl BackendDriver for InMemoryBackend {
        async fn initialize(&self) -> Result<(), BackendError> {
            Ok(())
        }
        async fn ping(&self) -> bool {
            true
        }
        async fn close(&self) {}
        async fn vector_search(&self, _e: &[f32], _l: usize) -> Result<Vec<RankedHit>, BackendError> {
            Ok(Vec::new())
        }
        async fn text_search(&self, _q: &str, _l: usize) -> Result<Vec<RankedHit>, BackendError> {
            Ok(Vec::new())
        }
        async fn fuzzy_search(&self, _q: &str, _l: usize) -> Result<Vec<RankedHit>, BackendError> {
            Ok(Vec::new())
        }
        async fn get(&self, id: i64) -> Result<Option<MemoryRecord>, BackendError> {
            Ok(self.records.lock().unwrap().get(&id).filter(|r| r.is_live()).cloned())
        }
        async fn list_recent(&self, _c: Option<&str>, _l: usize) -> Result<Vec<MemoryRecord>, BackendError> {
            Ok(Vec::new())
        }
        async fn insert_record(&self, new_memory: NewMemory) -> Result<i64, BackendError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let id = *next_id;
            let now = Utc::now();
            self.records.lock().unwrap().insert(
                id,
                MemoryRecord {
                    id,
                    content: new_memory.content,
                    title: new_memory.title,
                    category: new_memory.category,
                    record_type: new_memory.record_type,
                    tags: new_memory.tags,
                    embedding: None,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                },
            );
            Ok(id)
        }
        async fn update_record(&self, id: i64, patch: &MemoryPatch) -> Result<(), BackendError> {
            if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
                if let Some(content) = &patch.content {
                    record.content = content.clone();
                }
                record.updated_at = Utc::now();
            }
            Ok(())
        }
        async fn soft_delete_record(&self, id: i64, now: chrono::DateTime<Utc>) -> Result<(), BackendError> {
            if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
                record.deleted_at = Some(now);
            }
            Ok(())
        }
        async fn restore_record(&self, id: i64) -> Result<(), BackendError> {
            if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
                record.deleted_at = None;
            }
            Ok(())
        }
        async fn purge_expired_records(&self, cutoff: chrono::DateTime<Utc>) -> Result<u64, BackendError> {
            let mut records = self.records.lock().unwrap();
            let expired: Vec<i64> = records
                .iter()
                .filter(|(_, r)| r.deleted_at.map(|d| d < cutoff).unwrap_or(false))
                .map(|(id, _)| *id)
                .collect();
            for id in &expired {
                records.remove(id);
            }
            Ok(expired.len() as u64)
        }
        async fn store_embedding(&self, id: i64, vector: &[f32]) -> Result<(), BackendError> {
            if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
                record.embedding = Some(vector.to_vec());
            }
            Ok(())
        }
        async fn get_record_meta(&self, id: i64) -> Result<Option<RecordMeta>, BackendError> {
            Ok(self.records.lock().unwrap().get(&id).map(|r| RecordMeta {
                id: r.id,
                is_deleted: r.deleted_at.is_some(),
            }))
        }
        async fn get_primer_rows(&self) -> Result<Vec<PrimerRow>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn write_then_get_round_trips() {
        let backend = InMemoryBackend::default();
        let embedder = FixedEmbedder { vector: vec![0.1; 768] };
        let lifecycle = WriteLifecycle::new(&backend, &embedder, true, 30, "memories");

        let result = lifecycle
            .write(NewMemoryInput {
                content: "Annie Lin is the VP of Engineering at Meridian.",
                category: Some("people"),
                title: None,
                tags: &[],
            })
            .await
            .unwrap();

        assert!(result.ok);
        assert_eq!(result.embedded, Some(true));
        assert_eq!(result.path.as_deref(), Some("shadowdb/people/1"));

        let record = backend.get(result.id.unwrap()).await.unwrap().unwrap();
        assert!(record.content.contains("Annie Lin"));
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_open() {
        let backend = InMemoryBackend::default();
        // Embedder returns 512 dims; a real EmbeddingDispatcher would reject
        // this before it reaches us, but a misconfigured stub should still
        // only degrade the write, never fail it.
        struct AlwaysFailingEmbedder;
        #[async_trait]
        impl EmbeddingProvider for AlwaysFailingEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
                Err(EmbeddingError::DimensionMismatch {
                    expected: 768,
                    observed: 512,
                    label: "ollama:nomic-embed-text".to_string(),
                })
            }
            fn dimensions(&self) -> usize {
                768
            }
            fn label(&self) -> String {
                "ollama:nomic-embed-text".to_string()
            }
        }
        let embedder = AlwaysFailingEmbedder;
        let lifecycle = WriteLifecycle::new(&backend, &embedder, true, 30, "memories");

        let result = lifecycle
            .write(NewMemoryInput {
                content: "hi",
                category: None,
                title: None,
                tags: &[],
            })
            .await
            .unwrap();

        assert!(result.ok);
        assert_eq!(result.embedded, Some(false));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_undelete_restores() {
        let backend = InMemoryBackend::default();
        let embedder = FixedEmbedder { vector: vec![0.1; 768] };
        let lifecycle = WriteLifecycle::new(&backend, &embedder, false, 30, "memories");

        let id = lifecycle
            .write(NewMemoryInput {
                content: "test",
                category: None,
                title: None,
                tags: &[],
            })
            .await
            .unwrap()
            .id
            .unwrap();

        lifecycle.delete(id).await.unwrap();
        assert!(backend.get(id).await.unwrap().is_none());

        let second = lifecycle.delete(id).await.unwrap();
        assert!(second.message.contains("already deleted"));

        lifecycle.undelete(id).await.unwrap();
        assert!(backend.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_on_deleted_record_fails() {
        let backend = InMemoryBackend::default();
        let embedder = FixedEmbedder { vector: vec![0.1; 768] };
        let lifecycle = WriteLifecycle::new(&backend, &embedder, false, 30, "memories");

        let id = lifecycle
            .write(NewMemoryInput {
                content: "test",
                category: None,
                title: None,
                tags: &[],
            })
            .await
            .unwrap()
            .id
            .unwrap();
        lifecycle.delete(id).await.unwrap();

        let err = lifecycle
            .update(
                id,
                MemoryPatchInput {
                    content: Some("new content"),
                    title: None,
                    category: None,
                    tags: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WriteOpError::Invalid(WriteError::Deleted { .. })));
    }

    #[tokio::test]
    async fn update_omitting_category_keeps_existing_category_in_path() {
        let backend = InMemoryBackend::default();
        let embedder = FixedEmbedder { vector: vec![0.1; 768] };
        let lifecycle = WriteLifecycle::new(&backend, &embedder, false, 30, "memories");

        let id = lifecycle
            .write(NewMemoryInput {
                content: "Annie Lin is the VP of Engineering at Meridian.",
                category: Some("people"),
                title: None,
                tags: &[],
            })
            .await
            .unwrap()
            .id
            .unwrap();

        let result = lifecycle
            .update(
                id,
                MemoryPatchInput {
                    content: None,
                    title: Some("Annie Lin"),
                    category: None,
                    tags: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(result.path.as_deref(), Some("shadowdb/people/1"));
    }

    #[tokio::test]
    async fn retention_purge_removes_only_expired_soft_deletes() {
        let backend = InMemoryBackend::default();
        let embedder = FixedEmbedder { vector: vec![0.1; 768] };
        let lifecycle = WriteLifecycle::new(&backend, &embedder, false, 7, "memories");

        let id = lifecycle
            .write(NewMemoryInput {
                content: "old",
                category: None,
                title: None,
                tags: &[],
            })
            .await
            .unwrap()
            .id
            .unwrap();

        backend
            .soft_delete_record(id, Utc::now() - chrono::Duration::days(8))
            .await
            .unwrap();

        let purged = lifecycle.run_retention_purge().await.unwrap();
        assert_eq!(purged, 1);
        assert!(backend.get_record_meta(id).await.unwrap().is_none());
    }
}
