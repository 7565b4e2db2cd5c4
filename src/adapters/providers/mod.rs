//! Concrete adapters for the domain's port traits.

pub use crate::domain::ports::{CodeSplitter, EmbeddingProvider, VectorStoreProvider};

/// Embedding provider adapters (FastEmbed, generic HTTP, null, retry wrapper)
pub mod embedding;
/// The embedded SQLite + vec0 vector store adapter
pub mod vector_store;

pub use embedding::{
    FastEmbedProvider, HttpEmbeddingProvider, NullEmbeddingProvider, RetryingEmbeddingProvider,
};
pub use vector_store::SqliteVectorStore;
