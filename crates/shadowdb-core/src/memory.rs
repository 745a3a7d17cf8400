//! The memory record — the universal domain entity. Every row in the
//! `memories` table round-trips through this struct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CATEGORY, DEFAULT_RECORD_TYPE};

/// A single memory record.
///
/// Invariants upheld by construction/sanitization in `shadowdb-write`, not
/// re-validated here: `content` non-empty for live records, `tags`
/// deduplicated, `embedding` length equal to the configured dimension when
/// present, `updated_at >= created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub id: i64,
    pub content: String,
    pub title: Option<String>,
    pub category: String,
    pub record_type: String,
    pub tags: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn category_or_default(&self) -> &str {
        if self.category.is_empty() {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }
}

impl Default for MemoryRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            content: String::new(),
            title: None,
            category: DEFAULT_CATEGORY.to_string(),
            record_type: DEFAULT_RECORD_TYPE.to_string(),
            tags: Vec::new(),
            embedding: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Lightweight projection used where full content isn't needed — lifecycle
/// checks (`update`/`delete`/`undelete`) only need to know whether a record
/// exists and whether it's live.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMeta {
    pub id: i64,
    pub is_deleted: bool,
}

/// Sanitized input accepted by `insertRecord`. Produced by `shadowdb-write`
/// after validation; the id and timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMemory {
    pub content: String,
    pub title: Option<String>,
    pub category: String,
    pub record_type: String,
    pub tags: Vec<String>,
}

/// Patch applied by `update`: only the fields present are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryPatch {
    pub content: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl MemoryPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.title.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}
