//! # shadowdb-retrieval
//!
//! Hybrid search: runs the vector/lexical/fuzzy legs concurrently against a
//! `BackendDriver`, fuses them with Reciprocal Rank Fusion, applies a
//! recency boost, thresholds, and formats the result snippets.

pub mod engine;
pub mod rrf;
pub mod snippet;

pub use engine::{RetrievalEngine, SearchError};
