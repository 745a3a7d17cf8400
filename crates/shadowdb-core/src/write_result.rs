//! `WriteResult` models fail-open embedding as a value, not an exception
//! (see DESIGN.md, "fail-open embedding"). Every write-family operation
//! returns one of these.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteResult {
    pub ok: bool,
    pub id: Option<i64>,
    pub path: Option<String>,
    /// `None` for operations that don't touch embeddings (delete/undelete).
    pub embedded: Option<bool>,
    pub message: String,
}

impl WriteResult {
    pub fn success(id: i64, path: String, embedded: Option<bool>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: Some(id),
            path: Some(path),
            embedded,
            message: message.into(),
        }
    }

    pub fn idempotent(id: i64, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: Some(id),
            path: None,
            embedded: None,
            message: message.into(),
        }
    }
}
