use crate::domain::error::Result;
use crate::domain::types::{Chunk, CollectionMode, FilterExpr, SearchHit};
use async_trait::async_trait;

/// The embedded vector database backing one codebase's collection.
///
/// One `VectorStoreProvider` instance owns exactly one on-disk store file
/// for exactly one codebase id; the orchestrator is responsible for mapping
/// codebase ids to store instances via the path registry.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the collection if it does not already exist, with the given
    /// dimension and mode. Re-opening an existing collection with a
    /// matching dimension is a no-op; a dimension mismatch is a
    /// [`crate::domain::error::Error::Config`].
    async fn ensure_collection(&self, dimension: usize, mode: CollectionMode) -> Result<()>;

    /// Insert or replace chunks by id. Chunks must already carry a vector.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Remove every chunk whose `relative_path` is in `paths`.
    async fn delete_paths(&self, paths: &[String]) -> Result<()>;

    /// Remove every chunk in the collection.
    async fn clear(&self) -> Result<()>;

    /// Total chunk count currently stored.
    async fn count(&self) -> Result<usize>;

    /// Dense nearest-neighbor search against `query_vector`, optionally
    /// restricted by `filter`. Results are ordered by descending score.
    async fn search_dense(
        &self,
        query_vector: &[f32],
        top_k: usize,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<SearchHit>>;

    /// Hybrid search: fuse dense and lexical candidate lists via Reciprocal
    /// Rank Fusion. Only meaningful when the collection was created with
    /// [`CollectionMode::Hybrid`]; dense-only collections should route
    /// callers back to [`Self::search_dense`].
    async fn search_hybrid(
        &self,
        query_vector: &[f32],
        query_text: &str,
        top_k: usize,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<SearchHit>>;
}
