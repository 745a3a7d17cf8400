//! `Facade`: the single entrypoint a host holds. Owns the Embedding
//! Dispatcher, the chosen Backend Driver, and the session injection map;
//! resolves configuration once at construction (see DESIGN.md,
//! "configuration cascade").

use chrono::Utc;
use tracing::info;

use shadowdb_core::config::{BackendKind, ShadowDbConfig};
use shadowdb_core::constants::SNIPPET_CONTENT_CHARS;
use shadowdb_core::errors::{BackendError, ShadowDbError};
use shadowdb_core::search::{citation, virtual_path, virtual_path_category, SearchResult};
use shadowdb_core::traits::BackendDriver;
use shadowdb_core::write_result::WriteResult;
use shadowdb_embeddings::EmbeddingDispatcher;
use shadowdb_primer::SessionInjectionMap;
use shadowdb_retrieval::RetrievalEngine;
use shadowdb_write::{MemoryPatchInput, NewMemoryInput, WriteLifecycle};

use crate::errors::{from_search_error, from_write_error};
use crate::path::{self, ParsedPath};

/// `get`/`getByPath` return shape: rendered text plus its virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    pub text: String,
    pub path: String,
}

pub struct Facade {
    backend: Box<dyn BackendDriver>,
    embedder: EmbeddingDispatcher,
    session_cache: SessionInjectionMap,
    config: ShadowDbConfig,
}

impl Facade {
    pub async fn connect(config: ShadowDbConfig) -> Result<Self, ShadowDbError> {
        let (backend_kind, url, source) = shadowdb_core::config::resolve_connection(&config.connection);
        info!(%source, backend = ?backend_kind, "resolved shadowdb connection");

        let backend = connect_backend(backend_kind, &url, &config.table).await?;
        backend.initialize().await?;

        let embedder = EmbeddingDispatcher::new(config.embedding.clone());

        Ok(Self {
            backend,
            embedder,
            session_cache: SessionInjectionMap::new(),
            config,
        })
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: Option<usize>,
        min_score: Option<f64>,
    ) -> Result<Vec<SearchResult>, ShadowDbError> {
        let engine = RetrievalEngine::new(self.backend.as_ref(), &self.embedder, self.config.search.clone())
            .with_table(self.config.table.clone());
        engine
            .search(
                query,
                max_results.unwrap_or(self.config.search.max_results),
                min_score.unwrap_or(self.config.search.min_score),
            )
            .await
            .map_err(from_search_error)
    }

    pub async fn get(&self, id: i64) -> Result<Option<RecordView>, ShadowDbError> {
        let record = self.backend.get(id).await?;
        Ok(record.map(|r| RecordView {
            text: r.content,
            path: virtual_path(&r.category, r.id),
        }))
    }

    pub async fn get_by_path(
        &self,
        path: &str,
        from: Option<usize>,
        lines: Option<usize>,
    ) -> Result<Option<RecordView>, ShadowDbError> {
        match path::parse(path) {
            ParsedPath::ById(id) => {
                let view = self.get(id).await?;
                Ok(view.map(|v| RecordView {
                    text: slice_lines(&v.text, from, lines),
                    path: v.path,
                }))
            }
            ParsedPath::RecentInCategory(category) => {
                let records = self.backend.list_recent(Some(&category), 20).await?;
                Ok(Some(RecordView {
                    text: slice_lines(&render_listing(&records, &self.config.table), from, lines),
                    path: virtual_path_category(&category),
                }))
            }
            ParsedPath::RecentAll => {
                let records = self.backend.list_recent(None, 20).await?;
                Ok(Some(RecordView {
                    text: slice_lines(&render_listing(&records, &self.config.table), from, lines),
                    path: "shadowdb".to_string(),
                }))
            }
            ParsedPath::Invalid => Ok(None),
        }
    }

    pub async fn write(
        &self,
        content: &str,
        category: Option<&str>,
        title: Option<&str>,
        tags: &[String],
    ) -> Result<WriteResult, ShadowDbError> {
        let lifecycle = self.lifecycle();
        lifecycle
            .write(NewMemoryInput {
                content,
                category,
                title,
                tags,
            })
            .await
            .map_err(from_write_error)
    }

    pub async fn update(
        &self,
        id: i64,
        content: Option<&str>,
        title: Option<&str>,
        category: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<WriteResult, ShadowDbError> {
        let lifecycle = self.lifecycle();
        lifecycle
            .update(
                id,
                MemoryPatchInput {
                    content,
                    title,
                    category,
                    tags,
                },
            )
            .await
            .map_err(from_write_error)
    }

    pub async fn delete(&self, id: i64) -> Result<WriteResult, ShadowDbError> {
        self.lifecycle().delete(id).await.map_err(from_write_error)
    }

    pub async fn undelete(&self, id: i64) -> Result<WriteResult, ShadowDbError> {
        self.lifecycle().undelete(id).await.map_err(from_write_error)
    }

    /// Runs at service start when writes are enabled and `purgeAfterDays >
    /// 0`; no other automated schedule is mandated.
    pub async fn run_retention_purge_if_enabled(&self) -> Result<u64, BackendError> {
        if !self.config.writes.enabled {
            return Ok(0);
        }
        self.lifecycle().run_retention_purge().await
    }

    pub async fn ping(&self) -> bool {
        self.backend.ping().await
    }

    /// Swallows all backend errors per §7 — an inability to front-load
    /// context must never break a turn.
    pub async fn get_primer_context(&self, session_key: &str, model: Option<&str>) -> Option<String> {
        if !self.config.primer.enabled {
            return None;
        }

        let rows = self.backend.get_primer_rows().await.ok()?;
        let budget = self.config.primer.budget_for_model(model);
        let assembled = shadowdb_primer::assemble(&rows, budget)?;

        let now = Utc::now();
        let inject = shadowdb_primer::should_inject(
            self.config.primer.mode,
            &self.session_cache,
            session_key,
            &assembled.digest,
            self.config.primer.cache_ttl_ms,
            now,
        );
        if !inject {
            return None;
        }

        self.session_cache.record(session_key, &assembled.digest, now);
        Some(shadowdb_primer::envelope(&assembled))
    }

    fn lifecycle(&self) -> WriteLifecycle<'_> {
        WriteLifecycle::new(
            self.backend.as_ref(),
            &self.embedder,
            self.config.writes.auto_embed,
            self.config.writes.retention.purge_after_days,
            self.config.table.clone(),
        )
    }
}

async fn connect_backend(kind: BackendKind, url: &str, table: &str) -> Result<Box<dyn BackendDriver>, BackendError> {
    match kind {
        BackendKind::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let backend = shadowdb_storage::SqliteBackend::connect(url, table).await?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(BackendError::Unavailable {
                    detail: "sqlite backend feature not enabled".to_string(),
                })
            }
        }
        BackendKind::Postgres => {
            #[cfg(feature = "postgres")]
            {
                let backend = shadowdb_storage::PostgresBackend::connect(url, table).await?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(BackendError::Unavailable {
                    detail: "postgres backend feature not enabled".to_string(),
                })
            }
        }
        BackendKind::Mysql => {
            #[cfg(feature = "mysql")]
            {
                let backend = shadowdb_storage::MysqlBackend::connect(url, table).await?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "mysql"))]
            {
                Err(BackendError::Unavailable {
                    detail: "mysql backend feature not enabled".to_string(),
                })
            }
        }
    }
}

fn slice_lines(text: &str, from: Option<usize>, lines: Option<usize>) -> String {
    if from.is_none() && lines.is_none() {
        return text.to_string();
    }
    let all: Vec<&str> = text.lines().collect();
    let start = from.unwrap_or(0).min(all.len());
    let end = match lines {
        Some(n) => (start + n).min(all.len()),
        None => all.len(),
    };
    all[start..end].join("\n")
}

fn render_listing(records: &[shadowdb_core::memory::MemoryRecord], table: &str) -> String {
    records
        .iter()
        .map(|r| {
            let header = format!("## {} ({})", virtual_path(&r.category, r.id), citation(table, r.id));
            let body = match r.content.char_indices().nth(SNIPPET_CONTENT_CHARS) {
                Some((byte_idx, _)) => &r.content[..byte_idx],
                None => &r.content,
            };
            format!("{header}\n{body}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
