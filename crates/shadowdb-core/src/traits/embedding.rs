use async_trait::async_trait;

use crate::errors::EmbeddingError;

/// Embedding generation provider. Implementations are stateless and safe to
/// invoke concurrently.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text, returning a vector of exactly `dimensions()`
    /// floats (when `dimensions() > 0`).
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// The dimensionality this provider is configured to produce.
    fn dimensions(&self) -> usize;

    /// `provider:model`, used in dimension-mismatch diagnostics.
    fn label(&self) -> String;
}
