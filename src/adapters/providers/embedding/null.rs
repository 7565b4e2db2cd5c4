//! Null embedding provider, used as a safe stand-in in tests.

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingProvider;
use async_trait::async_trait;

/// Returns a fixed one-dimensional vector for every input. Never used in
/// the production provider registry, only constructed directly by tests.
#[derive(Debug, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    /// Construct a new null provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1_f32]).collect())
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn provider_name(&self) -> &str {
        "null"
    }
}
