//! Error taxonomy. Each subsystem owns a small `thiserror` enum; this module
//! aggregates them into one `ShadowDbError` so the Facade has a single error
//! type to propagate.

/// Embedding dispatcher errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider returned wrong dimensions: expected {expected}, got {observed} ({label})")]
    DimensionMismatch {
        expected: usize,
        observed: usize,
        label: String,
    },

    #[error("missing API key for provider {provider}")]
    ProviderAuth { provider: String },

    #[error("embedding provider {provider} request failed: {detail}")]
    ProviderTransport { provider: String, detail: String },

    #[error("embedding provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("command provider timed out after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },

    #[error("command provider exited with status {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("command provider produced unparseable output: {detail}")]
    CommandOutput { detail: String },
}

/// Backend driver errors (storage layer).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {detail}")]
    Unavailable { detail: String },

    #[error("query failed: {detail}")]
    QueryFailed { detail: String },

    #[error("record {id} not found")]
    NotFound { id: i64 },
}

/// Write/lifecycle core errors.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("{field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("record {id} not found")]
    NotFound { id: i64 },

    #[error("record {id} is soft-deleted; call undelete first")]
    Deleted { id: i64 },

    #[error("no fields provided to update")]
    NothingToUpdate,
}

/// Retrieval core errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("query is empty")]
    EmptyQuery,
}

/// Configuration resolution errors. Per §7, most malformed config falls back
/// to a default with a logged warning rather than erroring; this variant is
/// reserved for cases with no safe default (e.g. an unreadable connection
/// string when no cascade fallback applies).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration malformed: {detail}")]
    Malformed { detail: String },

    #[error("no connection information resolved from config, environment, or config file")]
    NoConnectionResolved,
}

/// Top-level error type returned across crate boundaries.
#[derive(Debug, thiserror::Error)]
pub enum ShadowDbError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ShadowDbResult<T> = Result<T, ShadowDbError>;
