//! Postgres backend: `pgvector` for the vector leg, `tsvector`/`ts_rank`
//! for lexical, `pg_trgm` `similarity()` for fuzzy.
//!
//! Schema is expected to be provisioned externally (the `memories` table,
//! its `pgvector` column, a GIN index on `to_tsvector(content)`, and the
//! `pg_trgm` extension); `initialize` only verifies connectivity and creates
//! the table when it's entirely absent, mirroring how the teacher's own
//! Postgres-backed store treats schema as mostly out-of-band (see
//! DESIGN.md).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::{PgPool, Row};

use shadowdb_core::errors::BackendError;
use shadowdb_core::memory::{MemoryPatch, MemoryRecord, NewMemory, RecordMeta};
use shadowdb_core::primer::PrimerRow;
use shadowdb_core::search::RankedHit;
use shadowdb_core::traits::BackendDriver;

pub struct PostgresBackend {
    pool: PgPool,
    table: String,
}

impl PostgresBackend {
    pub async fn connect(url: &str, table: impl Into<String>) -> Result<Self, BackendError> {
        let pool = crate::pool::pool_options::<sqlx::Postgres>()
            .connect(url)
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
}

#[async_trait]
impl BackendDriver for PostgresBackend {
    async fn initialize(&self) -> Result<(), BackendError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .ok();
        sqlx::query("CREATE EXTENSION IF NOT EXISTS pg_trgm")
            .execute(&self.pool)
            .await
            .ok();

        sqlx::query(&self.q(
            "CREATE TABLE IF NOT EXISTS {table} (
                id BIGSERIAL PRIMARY KEY,
                content TEXT NOT NULL,
                title TEXT,
                category TEXT NOT NULL DEFAULT 'general',
                record_type TEXT NOT NULL DEFAULT 'fact',
                tags TEXT[] NOT NULL DEFAULT '{}',
                embedding vector,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                deleted_at TIMESTAMPTZ
            )",
        ))
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS primer (
                key TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                priority INT,
                enabled BOOLEAN NOT NULL DEFAULT true
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
        let vector = Vector::from(embedding.to_vec());
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at,
                    1 - (embedding <=> $1) AS similarity
             FROM {table}
             WHERE deleted_at IS NULL AND embedding IS NOT NULL
             ORDER BY embedding <=> $1
             LIMIT $2",
        ))
        .bind(vector)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err)?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let similarity: f64 = row.try_get("similarity").map_err(sql_err)?;
                row_to_hit(row, i + 1, similarity)
            })
            .collect()
    }

    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<RankedHit>, BackendError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at,
                    ts_rank(to_tsvector('english', content), plainto_tsquery('english', $1)) AS rank_score
             FROM {table}
             WHERE deleted_at IS NULL
               AND to_tsvector('english', content) @@ plainto_tsquery('english', $1)
             ORDER BY rank_score DESC
             LIMIT $2",
        ))
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err)?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let raw_score: f64 = row.try_get("rank_score").unwrap_or(0.0);
                row_to_hit(row, i + 1, raw_score)
            })
            .collect()
    }

    async fn fuzzy_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RankedHit>, BackendError> {
        let trimmed = query.trim();
        if trimmed.chars().count() < 3 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at,
                    similarity(content, $1) AS sim
             FROM {table}
             WHERE deleted_at IS NULL AND similarity(content, $1) > 0.1
             ORDER BY sim DESC
             LIMIT $2",
        ))
        .bind(trimmed)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(sql_err)?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let sim: f64 = row.try_get::<f32, _>("sim").map(|f| f as f64).unwrap_or(0.0);
                row_to_hit(row, i + 1, sim)
            })
            .collect()
    }

    async fn get(&self, id: i64) -> Result<Option<MemoryRecord>, BackendError> {
        let row = sqlx::query(&self.q(
            "SELECT id, content, title, category, record_type, tags, embedding,
                    created_at, updated_at, deleted_at
             FROM {table} WHERE id = $1 AND deleted_at IS NULL",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(sql_err)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list_recent(
        &self,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError> {
        let rows = if let Some(category) = category {
            sqlx::query(&self.q(
                "SELECT id, content, title, category, record_type, tags, embedding,
                        created_at, updated_at, deleted_at
                 FROM {table} WHERE deleted_at IS NULL AND category = $1
                 ORDER BY created_at DESC LIMIT $2",
            ))
            .bind(category)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(&self.q(
                "SELECT id, content, title, category, record_type, tags, embedding,
                        created_at, updated_at, deleted_at
                 FROM {table} WHERE deleted_at IS NULL
                 ORDER BY created_at DESC LIMIT $1",
            ))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(sql_err)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn insert_record(&self, new_memory: NewMemory) -> Result<i64, BackendError> {
        let row = sqlx::query(&self.q(
            "INSERT INTO {table} (content, title, category, record_type, tags)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        ))
        .bind(&new_memory.content)
        .bind(&new_memory.title)
        .bind(&new_memory.category)
        .bind(&new_memory.record_type)
        .bind(&new_memory.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(sql_err)?;

        Ok(row.get("id"))
    }

    async fn update_record(&self, id: i64, patch: &MemoryPatch) -> Result<(), BackendError> {
        if let Some(content) = &patch.content {
            sqlx::query(&self.q("UPDATE {table} SET content = $1, updated_at = now() WHERE id = $2"))
                .bind(content)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(title) = &patch.title {
            sqlx::query(&self.q("UPDATE {table} SET title = $1, updated_at = now() WHERE id = $2"))
                .bind(title)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(category) = &patch.category {
            sqlx::query(&self.q("UPDATE {table} SET category = $1, updated_at = now() WHERE id = $2"))
                .bind(category)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(tags) = &patch.tags {
            sqlx::query(&self.q("UPDATE {table} SET tags = $1, updated_at = now() WHERE id = $2"))
                .bind(tags)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        Ok(())
    }

    async fn soft_delete_record(&self, id: i64, now: DateTime<Utc>) -> Result<(), BackendError> {
        sqlx::query(&self.q("UPDATE {table} SET deleted_at = $1 WHERE id = $2"))
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn restore_record(&self, id: i64) -> Result<(), BackendError> {
        sqlx::query(&self.q("UPDATE {table} SET deleted_at = NULL WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn purge_expired_records(&self, cutoff: DateTime<Utc>) -> Result<u64, BackendError> {
        let result = sqlx::query(&self.q(
            "DELETE FROM {table} WHERE deleted_at IS NOT NULL AND deleted_at < $1",
        ))
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;
        Ok(result.rows_affected())
    }

    async fn store_embedding(&self, id: i64, vector: &[f32]) -> Result<(), BackendError> {
        let vector = Vector::from(vector.to_vec());
        sqlx::query(&self.q("UPDATE {table} SET embedding = $1 WHERE id = $2"))
            .bind(vector)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn get_record_meta(&self, id: i64) -> Result<Option<RecordMeta>, BackendError> {
        let row = sqlx::query(&self.q("SELECT id, deleted_at FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sql_err)?;

        Ok(row.map(|row| RecordMeta {
            id: row.get("id"),
            is_deleted: row.get::<Option<DateTime<Utc>>, _>("deleted_at").is_some(),
        }))
    }

    async fn get_primer_rows(&self) -> Result<Vec<PrimerRow>, BackendError> {
        let rows = sqlx::query(
            "SELECT key, content, priority, enabled FROM primer
             WHERE enabled = true
             ORDER BY priority IS NULL, priority ASC, key ASC",
        )
        .fetch_all(&self.pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(_) => return Ok(Vec::new()),
        };

        Ok(rows
            .iter()
            .map(|row| PrimerRow {
                key: row.get("key"),
                content: row.get("content"),
                priority: row.get("priority"),
                enabled: row.get("enabled"),
            })
            .collect())
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<MemoryRecord, BackendError> {
    let embedding: Option<Vector> = row.try_get("embedding").map_err(sql_err)?;
    Ok(MemoryRecord {
        id: row.try_get("id").map_err(sql_err)?,
        content: row.try_get("content").map_err(sql_err)?,
        title: row.try_get("title").map_err(sql_err)?,
        category: row.try_get("category").map_err(sql_err)?,
        record_type: row.try_get("record_type").map_err(sql_err)?,
        tags: row.try_get("tags").map_err(sql_err)?,
        embedding: embedding.map(|v| v.as_slice().to_vec()),
        created_at: row.try_get("created_at").map_err(sql_err)?,
        updated_at: row.try_get("updated_at").map_err(sql_err)?,
        deleted_at: row.try_get("deleted_at").map_err(sql_err)?,
    })
}

fn row_to_hit(
    row: &sqlx::postgres::PgRow,
    rank: usize,
    raw_score: f64,
) -> Result<RankedHit, BackendError> {
    Ok(RankedHit {
        id: row.try_get("id").map_err(sql_err)?,
        content: row.try_get("content").map_err(sql_err)?,
        title: row.try_get("title").map_err(sql_err)?,
        category: row.try_get("category").map_err(sql_err)?,
        created_at: row.try_get("created_at").map_err(sql_err)?,
        rank,
        raw_score,
    })
}

fn sql_err(e: sqlx::Error) -> BackendError {
    BackendError::QueryFailed {
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Postgres-backed tests require a live server and are exercised in
    // integration environments with `SHADOWDB_TEST_POSTGRES_URL` set; no
    // fixture runs against a real server here, so coverage for this driver
    // lives in shadowdb-retrieval's backend-agnostic tests run against
    // SqliteBackend plus the query-string assertions below.

    #[test]
    fn table_name_is_interpolated_only_for_identifiers() {
        let backend = PostgresBackend {
            pool: unreachable_pool(),
            table: "memories".to_string(),
        };
        assert_eq!(
            backend.q("SELECT * FROM {table} WHERE id = $1"),
            "SELECT * FROM memories WHERE id = $1"
        );
    }

    fn unreachable_pool() -> PgPool {
        // Lazy pools never connect until first use; safe to construct
        // without a server for the interpolation test above.
        PgPool::connect_lazy("postgres://localhost/doesnotexist").unwrap()
    }
}
