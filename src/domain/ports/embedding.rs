use crate::domain::error::Result;
use async_trait::async_trait;

/// Transforms text into dense vectors for semantic search.
///
/// Implementations may be local (FastEmbed) or remote (an HTTP embedding
/// API). Only the behavioral contract matters to callers: given the same
/// model and input, `embed_batch` returns vectors of `dimensions()` length,
/// one per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        Ok(batch.remove(0))
    }

    /// Embed a batch of texts in one round trip. Returns one vector per
    /// input, in input order. Implementations should retry transient
    /// failures internally and only return [`crate::domain::error::Error::Embedding`]
    /// once the retry budget is exhausted.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Stable provider name, used in error messages and config validation.
    fn provider_name(&self) -> &str;

    /// Maximum input length, in the provider's own token units, before a
    /// chunk must be truncated to fit. `None` means no known limit.
    fn max_input_tokens(&self) -> Option<usize> {
        None
    }

    /// Health check for the provider. Default: embed a one-word probe.
    async fn health_check(&self) -> Result<()> {
        self.embed("health").await?;
        Ok(())
    }
}
