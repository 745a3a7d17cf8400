//! The primer row — ordered key/value pairs front-loaded into the host's
//! context by `shadowdb-primer`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimerRow {
    pub key: String,
    pub content: String,
    pub priority: Option<i32>,
    pub enabled: bool,
}

impl PrimerRow {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
            priority: Some(50),
            enabled: true,
        }
    }
}
