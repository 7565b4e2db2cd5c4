//! A semantic code search engine: walks a codebase, splits it into chunks
//! with a tree-sitter structural splitter (falling back to character
//! windows), embeds and stores them in a per-codebase SQLite + vector
//! index, and serves dense or hybrid semantic search over the result.

/// Concrete implementations of the domain ports: embedding providers and
/// the SQLite-backed vector store.
pub mod adapters;
/// Layered engine configuration.
pub mod config;
/// Domain types, errors, and ports.
pub mod domain;
/// Tree-sitter structural splitter with a character-based fallback.
pub mod chunking;
/// Ignore-rules engine gating which files ever reach a splitter.
pub mod ignore;
/// Coordinates indexing and search across codebases.
pub mod orchestrator;
/// Maps codebase paths to stable ids and on-disk store locations.
pub mod registry;
/// File hashing, Merkle roots, and snapshot diffing.
pub mod sync;

// Re-export core types for public API
pub use domain::error::{Error, Result};
pub use domain::types::*;

// Re-export the engine's entry points
pub use orchestrator::{IndexOrchestrator, ProgressCb};
