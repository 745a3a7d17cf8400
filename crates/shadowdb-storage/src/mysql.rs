//! MySQL backend targeting 9.2+: native `VECTOR` column + `VEC_DISTANCE_COSINE`
//! for the vector leg, `FULLTEXT`/`MATCH ... AGAINST` for lexical, a guarded
//! `LIKE` scan for fuzzy.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{MySqlPool, Row};

use shadowdb_core::errors::BackendError;
use shadowdb_core::memory::{MemoryPatch, MemoryRecord, NewMemory, RecordMeta};
use shadowdb_core::primer::PrimerRow;
use shadowdb_core::search::RankedHit;
use shadowdb_core::traits::BackendDriver;

pub struct MysqlBackend {
    pool: MySqlPool,
    table: String,
}

impl MysqlBackend {
    pub async fn connect(url: &str, table: impl Into<String>) -> Result<Self, BackendError> {
        let pool = crate::pool::pool_options::<sqlx::MySql>()
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
impl BackendDriver for MysqlBackend {
    async fn initialize(&self) -> Result<(), BackendError> {
        sqlx::query(&self.q(
            "CREATE TABLE IF NOT EXISTS {table} (
                id BIGINT AUTO_INCREMENT PRIMARY KEY,
                content TEXT NOT NULL,
                title TEXT,
                category VARCHAR(100) NOT NULL DEFAULT 'general',
                record_type VARCHAR(50) NOT NULL DEFAULT 'fact',
                tags JSON NOT NULL,
                embedding VECTOR(1536),
                created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                deleted_at DATETIME(6) NULL,
                FULLTEXT idx_content (content)
            )",
        ))
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS primer (
                `key` VARCHAR(200) PRIMARY KEY,
                content TEXT NOT NULL,
                priority INT NULL,
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
        let vec_literal = to_vec_literal(embedding);
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at,
                    1 - VEC_DISTANCE_COSINE(embedding, VEC_FromText(?)) AS similarity
             FROM {table}
             WHERE deleted_at IS NULL AND embedding IS NOT NULL
             ORDER BY similarity DESC
             LIMIT ?",
        ))
        .bind(vec_literal)
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
                    MATCH(content) AGAINST (? IN NATURAL LANGUAGE MODE) AS rank_score
             FROM {table}
             WHERE deleted_at IS NULL
               AND MATCH(content) AGAINST (? IN NATURAL LANGUAGE MODE)
             ORDER BY rank_score DESC
             LIMIT ?",
        ))
        .bind(query)
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
        let pattern = format!("%{}%", trimmed.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(&self.q(
            "SELECT id, content, title, category, created_at FROM {table}
             WHERE deleted_at IS NULL AND content LIKE ? LIMIT ?",
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
            "SELECT id, content, title, category, record_type, tags, embedding,
                    created_at, updated_at, deleted_at
             FROM {table} WHERE id = ? AND deleted_at IS NULL",
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
                 FROM {table} WHERE deleted_at IS NULL AND category = ?
                 ORDER BY created_at DESC LIMIT ?",
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
                 ORDER BY created_at DESC LIMIT ?",
            ))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(sql_err)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn insert_record(&self, new_memory: NewMemory) -> Result<i64, BackendError> {
        let tags_json = serde_json::to_string(&new_memory.tags).map_err(|e| BackendError::QueryFailed {
            detail: e.to_string(),
        })?;
        let result = sqlx::query(&self.q(
            "INSERT INTO {table} (content, title, category, record_type, tags)
             VALUES (?, ?, ?, ?, ?)",
        ))
        .bind(&new_memory.content)
        .bind(&new_memory.title)
        .bind(&new_memory.category)
        .bind(&new_memory.record_type)
        .bind(tags_json)
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;

        Ok(result.last_insert_id() as i64)
    }

    async fn update_record(&self, id: i64, patch: &MemoryPatch) -> Result<(), BackendError> {
        if let Some(content) = &patch.content {
            sqlx::query(&self.q("UPDATE {table} SET content = ?, updated_at = CURRENT_TIMESTAMP(6) WHERE id = ?"))
                .bind(content)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(title) = &patch.title {
            sqlx::query(&self.q("UPDATE {table} SET title = ?, updated_at = CURRENT_TIMESTAMP(6) WHERE id = ?"))
                .bind(title)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(category) = &patch.category {
            sqlx::query(&self.q("UPDATE {table} SET category = ?, updated_at = CURRENT_TIMESTAMP(6) WHERE id = ?"))
                .bind(category)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        if let Some(tags) = &patch.tags {
            let tags_json = serde_json::to_string(tags).map_err(|e| BackendError::QueryFailed {
                detail: e.to_string(),
            })?;
            sqlx::query(&self.q("UPDATE {table} SET tags = ?, updated_at = CURRENT_TIMESTAMP(6) WHERE id = ?"))
                .bind(tags_json)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(sql_err)?;
        }
        Ok(())
    }

    async fn soft_delete_record(&self, id: i64, now: DateTime<Utc>) -> Result<(), BackendError> {
        sqlx::query(&self.q("UPDATE {table} SET deleted_at = ? WHERE id = ?"))
            .bind(now.naive_utc())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn restore_record(&self, id: i64) -> Result<(), BackendError> {
        sqlx::query(&self.q("UPDATE {table} SET deleted_at = NULL WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn purge_expired_records(&self, cutoff: DateTime<Utc>) -> Result<u64, BackendError> {
        let result = sqlx::query(&self.q(
            "DELETE FROM {table} WHERE deleted_at IS NOT NULL AND deleted_at < ?",
        ))
        .bind(cutoff.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(sql_err)?;
        Ok(result.rows_affected())
    }

    async fn store_embedding(&self, id: i64, vector: &[f32]) -> Result<(), BackendError> {
        let literal = to_vec_literal(vector);
        sqlx::query(&self.q("UPDATE {table} SET embedding = VEC_FromText(?) WHERE id = ?"))
            .bind(literal)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;
        Ok(())
    }

    async fn get_record_meta(&self, id: i64) -> Result<Option<RecordMeta>, BackendError> {
        let row = sqlx::query(&self.q("SELECT id, deleted_at FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sql_err)?;

        Ok(row.map(|row| RecordMeta {
            id: row.get("id"),
            is_deleted: row.get::<Option<NaiveDateTime>, _>("deleted_at").is_some(),
        }))
    }

    async fn get_primer_rows(&self) -> Result<Vec<PrimerRow>, BackendError> {
        let rows = sqlx::query(
            "SELECT `key`, content, priority, enabled FROM primer
             WHERE enabled = true
             ORDER BY priority IS NULL, priority ASC, `key` ASC",
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

fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<MemoryRecord, BackendError> {
    let tags_json: String = row.try_get("tags").map_err(sql_err)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    let embedding_text: Option<String> = row.try_get("embedding").map_err(sql_err)?;

    Ok(MemoryRecord {
        id: row.try_get("id").map_err(sql_err)?,
        content: row.try_get("content").map_err(sql_err)?,
        title: row.try_get("title").map_err(sql_err)?,
        category: row.try_get("category").map_err(sql_err)?,
        record_type: row.try_get("record_type").map_err(sql_err)?,
        tags,
        embedding: embedding_text.map(|s| from_vec_literal(&s)),
        created_at: naive_to_utc(row.try_get("created_at").map_err(sql_err)?),
        updated_at: naive_to_utc(row.try_get("updated_at").map_err(sql_err)?),
        deleted_at: row
            .try_get::<Option<NaiveDateTime>, _>("deleted_at")
            .map_err(sql_err)?
            .map(naive_to_utc),
    })
}

fn row_to_hit(
    row: &sqlx::mysql::MySqlRow,
    rank: usize,
    raw_score: f64,
) -> Result<RankedHit, BackendError> {
    Ok(RankedHit {
        id: row.try_get("id").map_err(sql_err)?,
        content: row.try_get("content").map_err(sql_err)?,
        title: row.try_get("title").map_err(sql_err)?,
        category: row.try_get("category").map_err(sql_err)?,
        created_at: row
            .try_get::<Option<NaiveDateTime>, _>("created_at")
            .map_err(sql_err)?
            .map(naive_to_utc),
        rank,
        raw_score,
    })
}

fn naive_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

fn sql_err(e: sqlx::Error) -> BackendError {
    BackendError::QueryFailed {
        detail: e.to_string(),
    }
}

/// MySQL's `VEC_FromText` expects a JSON-array-shaped string, e.g. `[0.1,0.2]`.
fn to_vec_literal(v: &[f32]) -> String {
    let parts: Vec<String> = v.iter().map(|f| f.to_string()).collect();
    format!("[{}]", parts.join(","))
}

fn from_vec_literal(s: &str) -> Vec<f32> {
    s.trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .filter_map(|p| p.trim().parse::<f32>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_literal_roundtrips() {
        let original = vec![0.1_f32, -0.25, 3.0];
        let literal = to_vec_literal(&original);
        assert_eq!(literal, "[0.1,-0.25,3]");
        let parsed = from_vec_literal(&literal);
        assert_eq!(parsed.len(), 3);
    }
}
