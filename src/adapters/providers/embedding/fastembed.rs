//! Local embedding provider backed by the `fastembed` crate. Default
//! provider: no API key, no network access once the model is cached.

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingProvider;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

const DIMENSIONS: usize = 384;

/// Wraps a `fastembed::TextEmbedding` (BGE-small, 384 dimensions). The model
/// is loaded once at construction; `embed_batch` offloads the CPU-bound
/// inference to a blocking thread so it never stalls the async runtime.
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedProvider {
    /// Load the bundled BGE-small model. Downloads the ONNX weights to the
    /// local cache on first use.
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| Error::config(format!("failed to load fastembed model: {e}")))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let texts = texts.to_vec();
        let result = tokio::task::block_in_place(|| {
            let model = self
                .model
                .lock()
                .map_err(|_| Error::embedding("fastembed", "model lock poisoned"))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::embedding("fastembed", e.to_string()))
        })?;
        Ok(result)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn max_input_tokens(&self) -> Option<usize> {
        Some(512)
    }
}
