//! SQLite backend: FTS5 for lexical search, a guarded `LIKE` scan for
//! fuzzy/substring search, and brute-force cosine similarity for the
//! vector leg.
//!
//! The spec calls for the `sqlite-vec` loadable extension backing the
//! vector leg. That extension isn't guaranteed to be present at runtime (it
//! ships as a separate native binary), so — following the same fallback the
//! teacher codebase uses for its own vector leg — embeddings are stored as
//! a BLOB column and scored with an in-process cosine similarity scan. See
//! DESIGN.md.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use shadowdb_core::errors::BackendError;
use shadowdb_core::memory::{MemoryPatch, MemoryRecord, NewMemory, RecordMeta};
use shadowdb_core::primer::PrimerRow;
use shadowdb_core::search::RankedHit;
use shadowdb_core::traits::BackendDriver;

const MIN_FUZZY_QUERY_CHARS: usize = 3;

pub struct SqliteBackend {
    pool: SqlitePool,
    table: String,
}

impl SqliteBackend {
    pub async fn connect(url: &str, table: impl Into<String>) -> Result<Self, BackendError> {
        let options: SqliteConnectOptions = url.parse().map_err(|e| BackendError::Unavailable {
            detail: format!("invalid sqlite url: {e}"),
        })?;
        let options = options.create_if_missing(true);

        let pool = crate::pool::pool_options::<sqlx::Sqlite>()
            .connect_with(options)
            .await
            .map_err(|e| BackendError::Unavailable {
                detail: e.to_string(),
            })?;

        Ok(Self {
            pool,
            table: table.into(),
        })
    }

    /// For tests: an in-memory database with its own pool.
    pub async fn connect_in_memory(table: impl Into<String>) -> Result<Self, BackendError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BackendError::Unavailable {
                detail: e.to_string(),
            })?;
        Ok(Self {
            pool,
            table: table.into(),
        })
    }

    fn q(&self, sql: &str) -> String {
        sql.replace("{table}", &self.table)
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, BackendError> {
        let tags_json: String = row.try_get("tags").map_err(sql_err)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
        let embedding_blob: Option<Vec<u8>> = row.try_get("embedding").map_err(sql_err)?;

        Ok(MemoryRecord {
            id: row.try_get::<i64, _>("id").map_err(sql_err)?,
            content: row.try_get("content").map_err(sql_err)?,
            title: row.try_get("title").map_err(sql_err)?,
            category: row.try_get("category").map_err(sql_err)?,
            record_type: row.try_get("record_type").map_err(sql_err)?,
            tags,
            embedding: embedding_blob.map(|b| bytes_to_f32_vec(&b)),
            created_at: parse_ts(row.try_get("created_at").map_err(sql_err)?)?,
            updated_at: parse_ts(row.try_get("updated_at").map_err(sql_err)?)?,
            deleted_at: row
                .try_get::<Option<String>, _>("deleted_at")
                .map_err(sql_err)?
                .map(|s| parse_ts(s))
                .transpose()?,
        })
    }
}

#[async_trait]
impl BackendDriver for SqliteBackend {
    async fn initialize(&self) -> Result<(), BackendError> {
        sqlx::query(&self.q(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                title TEXT,
                category TEXT NOT NULL DEFAULT 'general',
                record_type TEXT NOT NULL DEFAULT 'fact',
                tags TEXT NOT NULL DEFAULT '[]',
                embedding BLOB,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            )",
        ))
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        sqlx::query(&self.q(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {table}_fts USING fts5(
                content, content='{table}', content_rowid='id'
            )",
        ))
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        for trigger_sql in [
            "CREATE TRIGGER IF NOT EXISTS {table}_ai AFTER INSERT ON {table} BEGIN
                INSERT INTO {table}_fts(rowid, content) VALUES (new.id, new.content);
            END",
            "CREATE TRIGGER IF NOT EXISTS {table}_ad AFTER DELETE ON {table} BEGIN
                INSERT INTO {table}_fts({table}_fts, rowid, content) VALUES ('delete', old.id, old.content);
            END",
            "CREATE TRIGGER IF NOT EXISTS {table}_au AFTER UPDATE ON {table} BEGIN
                INSERT INTO {table}_fts({table}_fts, rowid, content) VALUES ('delete', old.id, old.content);
                INSERT INTO {table}_fts(rowid, content) VALUES (new.id, new.content);
            END",
        ] {
            sqlx::query(&self.q(trigger_sql))
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS primer (
                key TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                priority INTEGER,
                enabled INTEGER NOT NULL DEFAULT 1
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        Ok(())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn vector_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RankedHit>, BackendError> {
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at, embedding
             FROM {table} WHERE deleted_at IS NULL AND embedding IS NOT NULL",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err)?;

        let mut scored: Vec<(f64, sqlx::sqlite::SqliteRow)> = Vec::new();
        for row in rows {
            let blob: Vec<u8> = row.try_get("embedding").map_err(sql_err)?;
            let stored = bytes_to_f32_vec(&blob);
            if stored.len() != embedding.len() {
                continue;
            }
            let sim = cosine_similarity(embedding, &stored);
            if sim > 0.0 {
                scored.push((sim, row));
            }
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (sim, row))| row_to_hit(&row, i + 1, sim))
            .collect()
    }

    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<RankedHit>, BackendError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&self.q(
            "SELECT m.id, m.content, m.title, m.category, m.created_at, bm25(t) AS rank_score
             FROM {table}_fts t JOIN {table} m ON m.id = t.rowid
             WHERE t.content MATCH ?1 AND m.deleted_at IS NULL
             ORDER BY rank_score ASC LIMIT ?2",
        ))
        .bind(sanitize_fts_query(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await;

        // Ordinary user strings must never cause this leg to error (e.g.
        // unbalanced FTS5 query syntax); treat a match-syntax failure as no
        // results instead of propagating it.
        let rows = match rows {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let raw_score: f64 = row.try_get("rank_score").unwrap_or(0.0);
                row_to_hit(row, i + 1, -raw_score)
            })
            .collect()
    }

    async fn fuzzy_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RankedHit>, BackendError> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_FUZZY_QUERY_CHARS {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", trimmed.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at FROM {table}
             WHERE deleted_at IS NULL AND content LIKE ?1 ESCAPE '\\' COLLATE NOCASE
             LIMIT ?2",
        ))
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err)?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| row_to_hit(row, i + 1, 1.0))
            .collect()
    }

    async fn get(&self, id: i64) -> Result<Option<MemoryRecord>, BackendError> {
        let row = sqlx::query(&self.q(
            "SELECT * FROM {table} WHERE id = ?1 AND deleted_at IS NULL",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(sql_err)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn list_recent(
        &self,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError> {
        let rows = if let Some(category) = category {
            sqlx::query(&self.q(
                "SELECT * FROM {table} WHERE deleted_at IS NULL AND category = ?1
                 ORDER BY created_at DESC LIMIT ?2",
            ))
            .bind(category)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(&self.q(
                "SELECT * FROM {table} WHERE deleted_at IS NULL
                 ORDER BY created_at DESC LIMIT ?1",
            ))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(sql_err)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn insert_record(&self, new_memory: NewMemory) -> Result<i64, BackendError> {
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&new_memory.tags).map_err(|e| BackendError::QueryFailed {
            detail: e.to_string(),
        })?;

        let result = sqlx::query(&self.q(
            "INSERT INTO {table} (content, title, category, record_type, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        ))
        .bind(&new_memory.content)
        .bind(&new_memory.title)
        .bind(&new_memory.category)
        .bind(&new_memory.record_type)
        .bind(tags_json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        Ok(result.last_insert_rowid())
    }

    async fn update_record(&self, id: i64, patch: &MemoryPatch) -> Result<(), BackendError> {
        let now = Utc::now().to_rfc3339();

        if let Some(content) = &patch.content {
            sqlx::query(&self.q("UPDATE {table} SET content = ?1, updated_at = ?2 WHERE id = ?3"))
                .bind(content)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(title) = &patch.title {
            sqlx::query(&self.q("UPDATE {table} SET title = ?1, updated_at = ?2 WHERE id = ?3"))
                .bind(title)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(category) = &patch.category {
            sqlx::query(&self.q("UPDATE {table} SET category = ?1, updated_at = ?2 WHERE id = ?3"))
                .bind(category)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(tags) = &patch.tags {
            let tags_json = serde_json::to_string(tags).map_err(|e| BackendError::QueryFailed {
                detail: e.to_string(),
            })?;
            sqlx::query(&self.q("UPDATE {table} SET tags = ?1, updated_at = ?2 WHERE id = ?3"))
                .bind(tags_json)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        Ok(())
    }

    async fn soft_delete_record(&self, id: i64, now: DateTime<Utc>) -> Result<(), BackendError> {
        sqlx::query(&self.q("UPDATE {table} SET deleted_at = ?1 WHERE id = ?2"))
            .bind(now.to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn restore_record(&self, id: i64) -> Result<(), BackendError> {
        sqlx::query(&self.q("UPDATE {table} SET deleted_at = NULL WHERE id = ?1"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn purge_expired_records(&self, cutoff: DateTime<Utc>) -> Result<u64, BackendError> {
        let result = sqlx::query(&self.q(
            "DELETE FROM {table} WHERE deleted_at IS NOT NULL AND deleted_at < ?1",
        ))
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;
        Ok(result.rows_affected())
    }

    async fn store_embedding(&self, id: i64, vector: &[f32]) -> Result<(), BackendError> {
        let blob = f32_vec_to_bytes(vector);
        sqlx::query(&self.q("UPDATE {table} SET embedding = ?1 WHERE id = ?2"))
            .bind(blob)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn get_record_meta(&self, id: i64) -> Result<Option<RecordMeta>, BackendError> {
        let row = sqlx::query(&self.q(
            "SELECT id, deleted_at FROM {table} WHERE id = ?1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(sql_err)?;

        Ok(row.map(|row| RecordMeta {
            id: row.get::<i64, _>("id"),
            is_deleted: row.get::<Option<String>, _>("deleted_at").is_some(),
        }))
    }

    async fn get_primer_rows(&self) -> Result<Vec<PrimerRow>, BackendError> {
        let rows = sqlx::query(
            "SELECT key, content, priority, enabled FROM primer
             WHERE enabled = 1
             ORDER BY priority IS NULL, priority ASC, key ASC",
        )
        .fetch_all(&self.pool)
        .await;

        // Missing table/columns are not errors (§4.5 step 1).
        let rows = match rows {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };

        Ok(rows
            .iter()
            .map(|row| PrimerRow {
                key: row.get("key"),
                content: row.get("content"),
                priority: row.get::<Option<i64>, _>("priority").map(|p| p as i32),
                enabled: row.get::<i64, _>("enabled") != 0,
            })
            .collect())
    }
}

fn row_to_hit(
    row: &sqlx::sqlite::SqliteRow,
    rank: usize,
    raw_score: f64,
) -> Result<RankedHit, BackendError> {
    Ok(RankedHit {
        id: row.try_get("id").map_err(sql_err)?,
        content: row.try_get("content").map_err(sql_err)?,
        title: row.try_get("title").map_err(sql_err)?,
        category: row.try_get("category").map_err(sql_err)?,
        created_at: row
            .try_get::<Option<String>, _>("created_at")
            .map_err(sql_err)?
            .map(|s| parse_ts(s))
            .transpose()?,
        rank,
        raw_score,
    })
}

fn sql_err(e: sqlx::Error) -> BackendError {
    BackendError::QueryFailed {
        detail: e.to_string(),
    }
}

fn parse_ts(s: String) -> Result<DateTime<Utc>, BackendError> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BackendError::QueryFailed {
            detail: format!("bad timestamp {s}: {e}"),
        })
}

/// FTS5 MATCH syntax treats `"`, `(`, `)`, `*`, `:`, `-`, `^` specially.
/// Quote the whole query as a phrase so ordinary punctuation in user text
/// never trips a syntax error.
fn sanitize_fts_query(query: &str) -> String {
    format!("\"{}\"", query.replace('"', "\"\""))
}

fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let backend = SqliteBackend::connect_in_memory("memories").await.unwrap();
        backend.initialize().await.unwrap();
        backend.initialize().await.unwrap();
        assert!(backend.ping().await);
    }

    #[tokio::test]
    async fn insert_get_roundtrip() {
        let backend = SqliteBackend::connect_in_memory("memories").await.unwrap();
        backend.initialize().await.unwrap();

        let id = backend
            .insert_record(NewMemory {
                content: "Annie Lin is the VP of Engineering at Meridian.".to_string(),
                title: None,
                category: "people".to_string(),
                record_type: "fact".to_string(),
                tags: vec![],
            })
            .await
            .unwrap();

        let record = backend.get(id).await.unwrap().unwrap();
        assert!(record.content.contains("Annie Lin"));
        assert_eq!(record.category, "people");
    }

    #[tokio::test]
    async fn soft_delete_hides_from_get_and_restore_brings_back() {
        let backend = SqliteBackend::connect_in_memory("memories").await.unwrap();
        backend.initialize().await.unwrap();
        let id = backend
            .insert_record(NewMemory {
                content: "test".to_string(),
                title: None,
                category: "general".to_string(),
                record_type: "fact".to_string(),
                tags: vec![],
            })
            .await
            .unwrap();

        backend.soft_delete_record(id, Utc::now()).await.unwrap();
        assert!(backend.get(id).await.unwrap().is_none());

        backend.restore_record(id).await.unwrap();
        assert!(backend.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fuzzy_search_rejects_short_queries_without_erroring() {
        let backend = SqliteBackend::connect_in_memory("memories").await.unwrap();
        backend.initialize().await.unwrap();
        let hits = backend.fuzzy_search("ab", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn text_search_tolerates_punctuation_heavy_queries() {
        let backend = SqliteBackend::connect_in_memory("memories").await.unwrap();
        backend.initialize().await.unwrap();
        backend
            .insert_record(NewMemory {
                content: "quarterly report (Q3) — revenue up".to_string(),
                title: None,
                category: "general".to_string(),
                record_type: "fact".to_string(),
                tags: vec![],
            })
            .await
            .unwrap();

        let hits = backend.text_search("(Q3)", 10).await.unwrap();
        // Must not error; may or may not match depending on tokenization.
        assert!(hits.len() <= 10);
    }

    #[tokio::test]
    async fn purge_removes_only_expired_soft_deletes() {
        let backend = SqliteBackend::connect_in_memory("memories").await.unwrap();
        backend.initialize().await.unwrap();
        let id = backend
            .insert_record(NewMemory {
                content: "old".to_string(),
                title: None,
                category: "general".to_string(),
                record_type: "fact".to_string(),
                tags: vec![],
            })
            .await
            .unwrap();

        let old_timestamp = Utc::now() - chrono::Duration::days(40);
        backend.soft_delete_record(id, old_timestamp).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(30);
        let purged = backend.purge_expired_records(cutoff).await.unwrap();
        assert_eq!(purged, 1);
        assert!(backend.get_record_meta(id).await.unwrap().is_none());
    }
}
