//! Core domain types for the semantic code search engine.
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Chunk`] | Immutable, line-ranged span of a source file with its vector |
//! | [`Language`] | Supported programming languages (tree-sitter grammars) |
//! | [`SearchHit`] | Ranked result returned from [`crate::orchestrator::IndexOrchestrator::semantic_search`] |
//! | [`CollectionMode`] | Dense-only vs hybrid table shape for a codebase's collection |
//! | [`CodebaseSnapshot`] | File-hash map + Merkle root for one codebase |
//! | [`SnapshotDiff`] | Added/modified/removed relative paths between two snapshots |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

/// A contiguous, line-ranged span of a source file, carrying its text and
/// (once embedded) its vector. Immutable once produced for a given file
/// content — re-chunking the same bytes must reproduce the same `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Chunk {
    /// Stable id derived from `(relative_path, start_line, end_line, content_hash)`
    #[validate(length(min = 1, message = "id cannot be empty"))]
    pub id: String,
    /// Path relative to the codebase root, forward-slash normalized
    #[validate(length(min = 1, message = "relative_path cannot be empty"))]
    pub relative_path: String,
    /// 1-based inclusive start line
    #[validate(range(min = 1, message = "start_line must be positive"))]
    pub start_line: u32,
    /// 1-based inclusive end line
    #[validate(range(min = 1, message = "end_line must be positive"))]
    pub end_line: u32,
    /// Lower-cased extension with leading dot, e.g. `.ts`
    pub file_extension: String,
    /// The chunk text
    #[validate(length(min = 1, message = "content cannot be empty"))]
    pub content: String,
    /// Free-form key/value metadata (language tag, splitter kind)
    pub metadata: ChunkMetadata,
    /// Embedding vector, populated once the orchestrator has embedded the
    /// chunk. `None` between splitting and embedding.
    pub vector: Option<Vec<f32>>,
}

/// Metadata carried alongside a chunk's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkMetadata {
    /// Detected language of the source file
    pub language: Language,
    /// Which splitter produced this chunk
    pub splitter: SplitterKind,
    /// Name of the enclosing declaration, when the structural splitter
    /// could identify one (function/class/module name).
    pub symbol: Option<String>,
}

/// Which code-splitter variant produced a chunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitterKind {
    /// Tree-sitter structural extraction
    #[default]
    Structural,
    /// Character-based size+overlap fallback
    Fallback,
}

/// Supported programming languages, each mapped to a tree-sitter grammar
/// registered in [`crate::chunking::languages`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Markdown,
    #[default]
    Unknown,
}

impl Language {
    /// Detect a language from a lower-cased, dot-prefixed file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".rs" => Self::Rust,
            ".py" => Self::Python,
            ".js" | ".jsx" | ".mjs" | ".cjs" => Self::JavaScript,
            ".ts" | ".tsx" => Self::TypeScript,
            ".java" => Self::Java,
            ".go" => Self::Go,
            ".c" | ".h" => Self::C,
            ".cc" | ".cpp" | ".cxx" | ".hpp" | ".hh" => Self::Cpp,
            ".cs" => Self::CSharp,
            ".rb" => Self::Ruby,
            ".php" => Self::Php,
            ".swift" => Self::Swift,
            ".kt" | ".kts" => Self::Kotlin,
            ".md" | ".markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Machine-stable lower-case name, used as the chunk metadata tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Go => "go",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Markdown => "markdown",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a name produced by [`Self::as_str`] back into a [`Language`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "rust" => Self::Rust,
            "python" => Self::Python,
            "javascript" => Self::JavaScript,
            "typescript" => Self::TypeScript,
            "java" => Self::Java,
            "go" => Self::Go,
            "c" => Self::C,
            "cpp" => Self::Cpp,
            "csharp" => Self::CSharp,
            "ruby" => Self::Ruby,
            "php" => Self::Php,
            "swift" => Self::Swift,
            "kotlin" => Self::Kotlin,
            "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }
}

/// Dense-only vs hybrid table shape for a codebase's collection. Fixed at
/// creation; changing mode requires dropping and recreating the collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    /// Dense vector table only
    Dense,
    /// Dense vector table plus a full-text index, fused via RRF
    Hybrid,
}

/// A single ranked hit returned from a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// The chunk's text
    pub content: String,
    /// Path relative to the codebase root
    pub relative_path: String,
    /// 1-based inclusive start line
    pub start_line: u32,
    /// 1-based inclusive end line
    pub end_line: u32,
    /// Detected language of the source file
    pub language: Language,
    /// Similarity in `[0, 1]`: `1 - cosine_distance`, clamped
    pub score: f32,
}

/// Outcome of a call to `index_codebase`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    /// All discovered chunks were written
    Completed,
    /// The hard chunk cap was hit; a prefix of the chunks was written
    LimitReached,
}

/// Statistics returned from a full indexing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexingStats {
    /// Number of files that contributed at least one chunk
    pub indexed_files: usize,
    /// Total chunks written to the store
    pub total_chunks: usize,
    /// Terminal status of the run
    pub status: IndexStatus,
}

/// File counts returned from an incremental re-index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SyncCounts {
    /// Newly discovered paths
    pub added: usize,
    /// Paths whose content hash changed
    pub modified: usize,
    /// Paths no longer present
    pub removed: usize,
}

/// Per-file content hash, keyed by relative path in [`CodebaseSnapshot`].
pub type FileHashMap = BTreeMap<String, String>;

/// Persisted file-hash map + Merkle root for one codebase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CodebaseSnapshot {
    /// `relative_path -> sha256hex`, always stored in sorted order
    pub file_hashes: FileHashMap,
    /// SHA-256 over the sorted `path\0hash\0` concatenation
    pub merkle_root: String,
}

/// The three-way diff between two [`CodebaseSnapshot`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SnapshotDiff {
    /// Paths only present in the current snapshot
    pub added: Vec<String>,
    /// Paths present in both with a changed hash
    pub modified: Vec<String>,
    /// Paths only present in the previous snapshot
    pub removed: Vec<String>,
}

impl SnapshotDiff {
    /// True if the diff carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed paths across all three sets.
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }
}

/// An entry in the path registry's directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryEntry {
    /// The 8-hex codebase id
    pub id: String,
    /// The original absolute path
    pub path: PathBuf,
    /// Size in bytes of the store file
    pub size_bytes: u64,
    /// Last-modified time of the store file, as Unix seconds
    pub modified_at: i64,
}

/// A single boolean comparison in a filter expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FilterExpr {
    /// `field = value`
    Eq(FilterField, String),
    /// `field IN [v1, v2, ...]`
    In(FilterField, Vec<String>),
    /// `lhs AND rhs`
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// `lhs OR rhs`
    Or(Box<FilterExpr>, Box<FilterExpr>),
}

/// The only fields the store's filter grammar may reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterField {
    /// `chunk.relative_path`
    RelativePath,
    /// `chunk.file_extension`
    FileExtension,
    /// `chunk.start_line`
    StartLine,
    /// `chunk.end_line`
    EndLine,
}

/// Phase of an indexing run, reported through progress callbacks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    /// Walking the tree and hashing files
    Discovering,
    /// Splitting files into chunks
    Chunking,
    /// Calling the embedding provider
    Embedding,
    /// Writing to the vector store
    Storing,
}

/// A single progress update emitted at batch boundaries during indexing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProgressUpdate {
    /// Current phase of the run
    pub phase: ProgressPhase,
    /// Units of work completed so far (chunks upserted, or files walked)
    pub current: usize,
    /// Total units of work expected, when known
    pub total: usize,
    /// `current / total` as a percentage in `[0, 100]`
    pub percentage: f32,
}

/// Observable lifecycle state of a single codebase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodebaseState {
    /// No collection exists yet
    Absent,
    /// Collection is being created/validated
    Preparing,
    /// A full or incremental indexing run is in progress
    Indexing,
    /// The last run completed without hitting the cap
    Completed,
    /// The last run hit the hard chunk cap
    LimitReached,
    /// The last run failed
    Failed,
    /// A search is in progress (transient, overlays Completed/LimitReached)
    Searching,
    /// `clear_index` is in progress
    Clearing,
}
