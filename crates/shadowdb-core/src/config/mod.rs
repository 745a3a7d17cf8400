mod connection;
mod embedding_config;
mod primer_config;
mod search_config;
mod writes_config;

pub use connection::{resolve_connection, BackendKind, ConnectionConfig, ConnectionSource};
pub use embedding_config::EmbeddingConfig;
pub use primer_config::{InjectMode, PrimerConfig};
pub use search_config::SearchConfig;
pub use writes_config::{RetentionConfig, WritesConfig};

use serde::{Deserialize, Serialize};

/// Root configuration, assembled once at Facade construction (see
/// DESIGN.md, "configuration cascade"). Later mutation of the process
/// environment is not honored mid-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowDbConfig {
    pub connection: ConnectionConfig,
    pub table: String,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub writes: WritesConfig,
    pub primer: PrimerConfig,
}

impl Default for ShadowDbConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            table: crate::constants::DEFAULT_TABLE_NAME.to_string(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            writes: WritesConfig::default(),
            primer: PrimerConfig::default(),
        }
    }
}
