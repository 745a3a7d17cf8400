//! Value types shared by the backend drivers and the retrieval core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hit from a single search leg (vector, text, or fuzzy). Not persisted;
/// produced fresh on every search and consumed immediately by RRF fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: i64,
    pub content: String,
    pub title: Option<String>,
    pub category: String,
    pub created_at: Option<DateTime<Utc>>,
    /// 1-based rank within the leg that produced this hit.
    pub rank: usize,
    /// Informational only; the retrieval core ignores this except for
    /// diagnostics. RRF fusion uses `rank`, not this value.
    pub raw_score: f64,
}

/// A result returned to the caller of `search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub virtual_path: String,
    pub score: f64,
    pub snippet: String,
    pub source: String,
    pub citation: String,
}

/// `shadowdb/{category}/{id}`
pub fn virtual_path(category: &str, id: i64) -> String {
    format!("shadowdb/{category}/{id}")
}

/// `shadowdb/{category}` — recent-20 listing in a category.
pub fn virtual_path_category(category: &str) -> String {
    format!("shadowdb/{category}")
}

/// `shadowdb:{table}#{id}`
pub fn citation(table: &str, id: i64) -> String {
    format!("shadowdb:{table}#{id}")
}
