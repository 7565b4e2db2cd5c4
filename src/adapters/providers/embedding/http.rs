//! Generic remote embedding provider, speaking the OpenAI-compatible
//! embeddings REST shape. Only the contract matters here, not a specific
//! vendor's quirks: POST `{base_url}{embeddings_path}` with a bearer token,
//! `{"input": [...], "model": "..."}`, get back `{"data": [{"embedding": [...]}]}`.
//! Covers both the `openai` and `voyageai` feature markers — they differ
//! only in base URL, model name and dimensions, which are config, not code.

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// A remote embedding provider reached over HTTP.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    provider_name: String,
    max_input_tokens: Option<usize>,
}

impl HttpEmbeddingProvider {
    /// Build a provider pointed at `base_url` (expected to already include
    /// the `/embeddings`-style path), authenticating with `api_key` as a
    /// bearer token.
    pub fn new(
        provider_name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            provider_name: provider_name.into(),
            max_input_tokens: None,
        }
    }

    /// Record the provider's known maximum input length.
    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = Some(max_input_tokens);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(&self.provider_name, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(
                &self.provider_name,
                format!("HTTP {status}: {body}"),
            ));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(&self.provider_name, e.to_string()))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn max_input_tokens(&self) -> Option<usize> {
        self.max_input_tokens
    }
}
