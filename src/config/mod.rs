//! Engine configuration: chunk budgets, indexing batching/caps, search
//! defaults, embedding provider selection, and ignore-rule overrides.
//!
//! Loaded in layers by [`loader::ConfigLoader`]: embedded defaults, an
//! optional user TOML file, then environment variables. The resulting
//! [`EngineConfig`] is validated before the orchestrator accepts it and is
//! threaded explicitly into its constructor — never read from a global at
//! call time.

pub mod loader;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Chunk size and overlap budget shared by the structural and fallback
/// splitters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChunkingConfig {
    /// Target chunk size, in characters.
    #[validate(range(min = 1))]
    pub chunk_size: usize,
    /// Overlap carried between consecutive fallback-split chunks.
    pub chunk_overlap: usize,
}

/// Batching and hard-cap behavior of the index orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IndexingConfig {
    /// Number of chunk texts embedded per batch.
    #[validate(range(min = 1))]
    pub batch_size: usize,
    /// Hard cap on total chunks stored per codebase.
    #[validate(range(min = 1))]
    pub max_chunks: usize,
}

/// Defaults applied to `semanticSearch` calls that do not override them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    /// Default number of hits returned.
    #[validate(range(min = 1))]
    pub default_top_k: usize,
    /// Minimum similarity a hit must clear to be returned.
    pub default_threshold: f32,
    /// Reciprocal Rank Fusion constant.
    pub rrf_k: f32,
    /// Whether newly created collections default to hybrid mode.
    pub hybrid: bool,
}

/// Selects and configures the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmbeddingConfig {
    /// One of `null`, `fastembed`, `openai`, `voyageai`, or any other HTTP
    /// provider sharing the OpenAI-compatible request/response shape.
    pub provider: String,
    /// Base URL for HTTP-backed providers.
    #[serde(default)]
    pub base_url: String,
    /// API key for HTTP-backed providers.
    #[serde(default)]
    pub api_key: String,
    /// Model name passed to the provider.
    #[serde(default)]
    pub model: String,
    /// Vector dimension; 0 means "ask the provider".
    pub dimensions: usize,
    /// Maximum input tokens the provider accepts; 0 means unbounded.
    #[serde(default)]
    pub max_input_tokens: usize,
}

/// Ignore-rules overrides layered on top of the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct IgnoreConfig {
    /// Extra gitignore-style patterns, additive to the built-in set.
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

/// Embedding provider retry/backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetryConfig {
    /// Maximum attempts, including the first.
    #[validate(range(min = 1))]
    pub max_attempts: u32,
    /// Base delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Exponential backoff multiplier applied per attempt.
    pub factor: f64,
}

/// The engine's complete, validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Chunking budget
    #[validate(nested)]
    pub chunking: ChunkingConfig,
    /// Batching and cap behavior
    #[validate(nested)]
    pub indexing: IndexingConfig,
    /// Search defaults
    #[validate(nested)]
    pub search: SearchConfig,
    /// Embedding provider selection
    #[validate(nested)]
    pub embedding: EmbeddingConfig,
    /// Ignore-rule overrides
    #[validate(nested)]
    pub ignore: IgnoreConfig,
    /// Embedding retry policy
    #[validate(nested)]
    pub retry: RetryConfig,
}
