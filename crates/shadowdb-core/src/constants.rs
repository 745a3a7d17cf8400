//! Tunable defaults. Every value here is overridable via configuration;
//! these are the values used when a config field is absent or invalid.

/// shadowdb version, for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding dimension when configuration doesn't specify one.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Text is truncated to this many characters before being sent to any
/// embedding provider.
pub const EMBEDDING_INPUT_TRUNCATE_CHARS: usize = 8_000;

/// Default timeout for the `command` embedding provider's subprocess.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 15_000;

/// Response/stderr snippets surfaced in errors are capped at these lengths.
pub const HTTP_ERROR_BODY_SNIPPET_CHARS: usize = 300;
pub const COMMAND_STDERR_SNIPPET_CHARS: usize = 500;

/// Record field limits (see `MemoryRecord` invariants).
pub const MAX_CONTENT_CHARS: usize = 100_000;
pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_CATEGORY_CHARS: usize = 100;
pub const MAX_TAG_CHARS: usize = 200;
pub const MAX_TAGS: usize = 50;

pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_RECORD_TYPE: &str = "fact";

/// Connection pool shape, identical across all three backends.
pub const POOL_MAX_CONNECTIONS: u32 = 3;
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 30;
pub const POOL_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Retrieval defaults.
pub const DEFAULT_MAX_RESULTS: usize = 6;
pub const DEFAULT_MIN_SCORE: f64 = 0.005;
pub const MIN_SCORE_FLOOR: f64 = 0.001;
pub const RRF_K: f64 = 60.0;
pub const DEFAULT_VECTOR_WEIGHT: f64 = 0.7;
pub const DEFAULT_TEXT_WEIGHT: f64 = 0.3;
pub const FUZZY_WEIGHT: f64 = 0.2;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.15;
pub const OVERSAMPLE_FACTOR: usize = 5;
pub const SNIPPET_CONTENT_CHARS: usize = 700;

/// Write/lifecycle defaults.
pub const DEFAULT_PURGE_AFTER_DAYS: i64 = 30;

/// Primer defaults.
pub const DEFAULT_PRIMER_MAX_CHARS: usize = 4_000;
pub const PRIMER_TRUNCATION_SUFFIX: &str = "\n\n[...primer context truncated...]";
pub const PRIMER_SECTION_BOUNDARY_WINDOW: usize = 500;
pub const PRIMER_PARAGRAPH_BOUNDARY_WINDOW: usize = 300;
pub const PRIMER_SENTENCE_BOUNDARY_WINDOW: usize = 200;
pub const PRIMER_WORD_BOUNDARY_WINDOW: usize = 100;

/// Session injection map bound and eviction stride (20% of the bound).
pub const SESSION_MAP_MAX_ENTRIES: usize = 5_000;
pub const SESSION_MAP_EVICTION_COUNT: usize = 1_000;

pub const DEFAULT_TABLE_NAME: &str = "memories";
