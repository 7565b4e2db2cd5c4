use crate::domain::types::{Chunk, Language};

/// Splits a single file's content into [`Chunk`]s.
///
/// Implementations never fail: a splitter that cannot make sense of its
/// input degrades to coarser chunks rather than returning an error, so a
/// single malformed file never aborts an indexing run. See
/// [`crate::chunking::StructuralSplitter`] for the tree-sitter based
/// implementation and [`crate::chunking::FallbackSplitter`] for its
/// per-file fallback.
pub trait CodeSplitter: Send + Sync {
    /// Split `content`, taken from `relative_path`, into chunks.
    ///
    /// `relative_path` is used only to populate [`Chunk::relative_path`]
    /// and to derive [`Chunk::file_extension`]; the splitter does not read
    /// the filesystem itself.
    fn split(&self, relative_path: &str, content: &str, language: Language) -> Vec<Chunk>;
}
