//! Domain port interfaces
//!
//! Trait-based boundary contracts between the domain and its adapters.
//! Adapters depend on these traits; the domain never depends on an adapter.
//!
//! - **embedding.rs** — text-to-vector providers
//! - **chunking.rs** — code splitters
//! - **vector_store.rs** — the embedded vector database

/// Code-splitter contract implemented by the structural and fallback splitters
pub mod chunking;
/// Text embedding provider contract
pub mod embedding;
/// Vector store contract implemented by the SQLite-backed adapter
pub mod vector_store;

pub use chunking::CodeSplitter;
pub use embedding::EmbeddingProvider;
pub use vector_store::VectorStoreProvider;
