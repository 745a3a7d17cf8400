//! # shadowdb-embeddings
//!
//! Multi-provider embedding dispatcher. Maps a text string to a
//! fixed-dimension vector via one of six providers, enforcing the
//! configured dimension on every call.

pub mod dispatcher;
mod providers;

pub use dispatcher::{normalize_provider_name, EmbeddingDispatcher, Provider};
