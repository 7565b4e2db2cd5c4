//! Code splitting: tree-sitter structural extraction with a per-file
//! character-based fallback.
//!
//! ```text
//! file content
//!     |
//!     v
//! StructuralSplitter::try_split  -- Some(chunks) --> done
//!     |
//!    None (no grammar / parse failure / no definitions found)
//!     v
//! FallbackSplitter::split  -------------------------> done
//! ```
//!
//! The fallback is applied per file, never for the whole run: one file with
//! an unsupported or malformed structure never degrades the rest of a
//! codebase to character chunking.

/// Size+overlap character splitter, the structural splitter's fallback
pub mod fallback;
/// Tree-sitter grammar and node-kind registry
pub mod languages;
/// Tree-sitter based structural splitter
pub mod structural;

use crate::domain::ports::CodeSplitter;
use crate::domain::types::{Chunk, Language};
use fallback::FallbackSplitter;
use structural::StructuralSplitter;

/// Composes the structural and fallback splitters behind the
/// [`CodeSplitter`] port.
#[derive(Debug, Default)]
pub struct HybridSplitter {
    structural: StructuralSplitter,
    fallback: FallbackSplitter,
}

impl HybridSplitter {
    /// Construct a hybrid splitter using default chunk budgets.
    pub fn new() -> Self {
        Self {
            structural: StructuralSplitter::new(),
            fallback: FallbackSplitter::new(),
        }
    }

    /// Construct a hybrid splitter honoring a configured chunk size and
    /// overlap, applied to both the structural cap and the fallback window.
    pub fn with_budget(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            structural: StructuralSplitter::with_max_chars(chunk_size),
            fallback: FallbackSplitter::with_budget(chunk_size, chunk_overlap),
        }
    }
}

impl CodeSplitter for HybridSplitter {
    fn split(&self, relative_path: &str, content: &str, language: Language) -> Vec<Chunk> {
        match self.structural.try_split(relative_path, content, language) {
            Some(chunks) => chunks,
            None => self.fallback.split(relative_path, content, language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_for_markdown() {
        let splitter = HybridSplitter::new();
        let chunks = splitter.split("README.md", "# Title\n\nSome text.\n", Language::Markdown);
        assert!(!chunks.is_empty());
        assert_eq!(
            chunks[0].metadata.splitter,
            crate::domain::types::SplitterKind::Fallback
        );
    }

    #[test]
    fn structural_split_for_rust_function() {
        let splitter = HybridSplitter::new();
        let source = "fn one() {}\n\nfn two() {}\n";
        let chunks = splitter.split("lib.rs", source, Language::Rust);
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].metadata.splitter,
            crate::domain::types::SplitterKind::Structural
        );
    }
}
