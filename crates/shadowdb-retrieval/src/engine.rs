//! `RetrievalEngine`: query → embed → fan out three legs → RRF fuse →
//! recency boost → threshold → truncate → format.

use chrono::Utc;
use tracing::{debug, warn};

use shadowdb_core::config::SearchConfig;
use shadowdb_core::constants::{DEFAULT_TABLE_NAME, FUZZY_WEIGHT, MIN_SCORE_FLOOR, OVERSAMPLE_FACTOR};
use shadowdb_core::errors::{BackendError, EmbeddingError, RetrievalError};
use shadowdb_core::search::{citation, virtual_path, SearchResult};
use shadowdb_core::traits::{BackendDriver, EmbeddingProvider};

use crate::rrf::{apply_recency_boost, fuse, Leg};
use crate::snippet::format_snippet;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct RetrievalEngine<'a> {
    backend: &'a dyn BackendDriver,
    embedder: &'a dyn EmbeddingProvider,
    config: SearchConfig,
    table: String,
}

impl<'a> RetrievalEngine<'a> {
    pub fn new(backend: &'a dyn BackendDriver, embedder: &'a dyn EmbeddingProvider, config: SearchConfig) -> Self {
        Self {
            backend,
            embedder,
            config,
            table: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        min_score: f64,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(RetrievalError::EmptyQuery.into());
        }

        let embedding = self.embedder.embed(trimmed).await?;

        let oversample = max_results.max(1) * OVERSAMPLE_FACTOR;

        let (vector_hits, text_hits, fuzzy_hits) = tokio::join!(
            self.backend.vector_search(&embedding, oversample),
            self.backend.text_search(trimmed, oversample),
            self.backend.fuzzy_search(trimmed, oversample),
        );

        let vector_hits = vector_hits.unwrap_or_else(|e| {
            warn!(error = %e, "vector leg failed, treating as empty");
            Vec::new()
        });
        let text_hits = text_hits.unwrap_or_else(|e| {
            warn!(error = %e, "text leg failed, treating as empty");
            Vec::new()
        });
        let fuzzy_hits = fuzzy_hits.unwrap_or_else(|e| {
            warn!(error = %e, "fuzzy leg failed, treating as empty");
            Vec::new()
        });

        debug!(
            vector = vector_hits.len(),
            text = text_hits.len(),
            fuzzy = fuzzy_hits.len(),
            "leg results before fusion"
        );

        let legs = [
            Leg::new(&vector_hits, self.config.vector_weight),
            Leg::new(&text_hits, self.config.text_weight),
            Leg::new(&fuzzy_hits, FUZZY_WEIGHT),
        ];
        let mut fused = fuse(&legs);

        apply_recency_boost(&mut fused, self.config.recency_weight);

        let threshold = min_score.max(MIN_SCORE_FLOOR);
        fused.retain(|h| h.score > threshold);

        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        fused.truncate(max_results);

        let now = Utc::now();
        Ok(fused
            .into_iter()
            .map(|hit| SearchResult {
                virtual_path: virtual_path(&hit.category, hit.id),
                score: hit.score,
                snippet: format_snippet(&hit.category, hit.created_at, &hit.content, now),
                source: self.table.clone(),
                citation: citation(&self.table, hit.id),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shadowdb_core::memory::{MemoryPatch, MemoryRecord, NewMemory, RecordMeta};
    use shadowdb_core::primer::PrimerRow;
    use shadowdb_core::search::RankedHit;
    use std::sync::Mutex;

    struct StubEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
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

    struct StubBackend {
        vector_hits: Vec<RankedHit>,
        text_hits: Vec<RankedHit>,
        fuzzy_hits: Vec<RankedHit>,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl BackendDriver for StubBackend {
        async fn initialize(&self) -> Result<(), BackendError> {
            Ok(())
        }
        async fn ping(&self) -> bool {
            true
        }
        async fn close(&self) {}
        async fn vector_search(&self, _e: &[f32], _limit: usize) -> Result<Vec<RankedHit>, BackendError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.vector_hits.clone())
        }
        async fn text_search(&self, _q: &str, _limit: usize) -> Result<Vec<RankedHit>, BackendError> {
            Ok(self.text_hits.clone())
        }
        async fn fuzzy_search(&self, _q: &str, _limit: usize) -> Result<Vec<RankedHit>, BackendError> {
            Ok(self.fuzzy_hits.clone())
        }
        async fn get(&self, _id: i64) -> Result<Option<MemoryRecord>, BackendError> {
            Ok(None)
        }
        async fn list_recent(&self, _c: Option<&str>, _l: usize) -> Result<Vec<MemoryRecord>, BackendError> {
            Ok(Vec::new())
        }
        async fn insert_record(&self, _n: NewMemory) -> Result<i64, BackendError> {
            Ok(1)
        }
        async fn update_record(&self, _id: i64, _p: &MemoryPatch) -> Result<(), BackendError> {
            Ok(())
        }
        async fn soft_delete_record(&self, _id: i64, _now: chrono::DateTime<Utc>) -> Result<(), BackendError> {
            Ok(())
        }
        async fn restore_record(&self, _id: i64) -> Result<(), BackendError> {
            Ok(())
        }
        async fn purge_expired_records(&self, _cutoff: chrono::DateTime<Utc>) -> Result<u64, BackendError> {
            Ok(0)
        }
        async fn store_embedding(&self, _id: i64, _v: &[f32]) -> Result<(), BackendError> {
            Ok(())
        }
        async fn get_record_meta(&self, _id: i64) -> Result<Option<RecordMeta>, BackendError> {
            Ok(None)
        }
        async fn get_primer_rows(&self) -> Result<Vec<PrimerRow>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn hit(id: i64, content: &str, rank: usize) -> RankedHit {
        RankedHit {
            id,
            content: content.to_string(),
            title: None,
            category: "people".to_string(),
            created_at: None,
            rank,
            raw_score: 0.0,
        }
    }

    #[tokio::test]
    async fn empty_query_fails_before_embedding() {
        let embedder = StubEmbedder { vector: vec![0.1; 4] };
        let backend = StubBackend {
            vector_hits: vec![],
            text_hits: vec![],
            fuzzy_hits: vec![],
            calls: Mutex::new(0),
        };
        let engine = RetrievalEngine::new(&backend, &embedder, SearchConfig::default());

        let err = engine.search("   ", 6, 0.005).await.unwrap_err();
        assert!(matches!(err, SearchError::Retrieval(RetrievalError::EmptyQuery)));
        assert_eq!(*backend.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn write_then_search_surfaces_top_hit() {
        let embedder = StubEmbedder { vector: vec![0.1; 4] };
        let backend = StubBackend {
            vector_hits: vec![hit(1, "Annie Lin is the VP of Engineering at Meridian.", 1)],
            text_hits: vec![hit(1, "Annie Lin is the VP of Engineering at Meridian.", 1)],
            fuzzy_hits: vec![],
            calls: Mutex::new(0),
        };
        let engine = RetrievalEngine::new(&backend, &embedder, SearchConfig::default());

        let results = engine.search("Annie Lin", 3, 0.005).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].virtual_path, "shadowdb/people/1");
    }

    #[tokio::test]
    async fn all_legs_empty_yields_empty_results() {
        let embedder = StubEmbedder { vector: vec![0.1; 4] };
        let backend = StubBackend {
            vector_hits: vec![],
            text_hits: vec![],
            fuzzy_hits: vec![],
            calls: Mutex::new(0),
        };
        let engine = RetrievalEngine::new(&backend, &embedder, SearchConfig::default());

        let results = engine.search("nothing matches", 6, 0.005).await.unwrap();
        assert!(results.is_empty());
    }
}
