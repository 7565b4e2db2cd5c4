//! Tree-sitter based structural splitter.
//!
//! Parses a file and extracts one chunk per top-level "definition" node
//! (function, type, impl block — see [`super::languages::definition_node_kinds`]).
//! Returns `None` when the grammar is unavailable or the parse yields no
//! definitions at all, signaling the caller to fall back to
//! [`super::fallback::FallbackSplitter`] for this one file.

use super::languages::{definition_node_kinds, grammar_for};
use crate::domain::types::{Chunk, ChunkMetadata, Language, SplitterKind};
use sha2::{Digest, Sha256};
use tree_sitter::{Node, Parser};

/// Maximum characters kept in a single chunk's content. An oversize
/// definition is truncated at this boundary rather than re-split, so a
/// chunk's identity never depends on where a second split pass would have
/// cut it.
const MAX_CHUNK_CHARS: usize = 2500;

/// Splits source text by walking its AST for known definition node kinds.
#[derive(Debug)]
pub struct StructuralSplitter {
    max_chunk_chars: usize,
}

impl Default for StructuralSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralSplitter {
    /// Construct a structural splitter using the default chunk size cap.
    pub fn new() -> Self {
        Self {
            max_chunk_chars: MAX_CHUNK_CHARS,
        }
    }

    /// Construct a structural splitter with a configured chunk size cap.
    pub fn with_max_chars(max_chunk_chars: usize) -> Self {
        Self { max_chunk_chars }
    }

    /// Attempt a structural split of `content`. `None` means: no grammar
    /// for `language`, the parse failed outright, or no definition nodes
    /// were found — the caller should fall back per-file in all three
    /// cases.
    pub fn try_split(&self, relative_path: &str, content: &str, language: Language) -> Option<Vec<Chunk>> {
        let grammar = grammar_for(language)?;
        let kinds = definition_node_kinds(language);
        if kinds.is_empty() {
            return None;
        }

        let mut parser = Parser::new();
        parser.set_language(&grammar).ok()?;
        let tree = parser.parse(content, None)?;
        if tree.root_node().has_error() && tree.root_node().child_count() == 0 {
            return None;
        }

        let mut chunks = Vec::new();
        collect_definitions(tree.root_node(), content, kinds, 0, &mut chunks);

        if chunks.is_empty() {
            return None;
        }

        Some(
            chunks
                .into_iter()
                .map(|(node, symbol)| {
                    build_chunk(relative_path, content, language, node, symbol, self.max_chunk_chars)
                })
                .collect(),
        )
    }
}

/// Walk down to `max_depth` looking for nodes whose kind is in `kinds`.
/// Stops descending once a matching node is found, so nested definitions
/// (e.g. a method inside an already-matched `impl_item`) are only captured
/// once, at the outermost enclosing definition.
fn collect_definitions<'a>(
    node: Node<'a>,
    source: &str,
    kinds: &[&str],
    depth: usize,
    out: &mut Vec<(Node<'a>, Option<String>)>,
) {
    if depth > 3 {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            let symbol = definition_name(child, source);
            out.push((child, symbol));
        } else {
            collect_definitions(child, source, kinds, depth + 1, out);
        }
    }
}

/// Best-effort extraction of a definition's name, via its first `identifier`
/// child. Not all grammars name the field the same way, so this scans
/// immediate children rather than relying on a field name.
fn definition_name(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind().contains("identifier") {
            return child.utf8_text(source.as_bytes()).ok().map(str::to_string);
        }
    }
    None
}

fn build_chunk(
    relative_path: &str,
    source: &str,
    language: Language,
    node: Node<'_>,
    symbol: Option<String>,
    max_chunk_chars: usize,
) -> Chunk {
    let mut text = node
        .utf8_text(source.as_bytes())
        .unwrap_or_default()
        .to_string();
    if text.chars().count() > max_chunk_chars {
        text = text.chars().take(max_chunk_chars).collect();
    }

    let start_line = node.start_position().row as u32 + 1;
    let end_line = node.end_position().row as u32 + 1;
    let file_extension = extension_of(relative_path);

    Chunk {
        id: chunk_id(relative_path, start_line, end_line, &text),
        relative_path: relative_path.to_string(),
        start_line,
        end_line,
        file_extension,
        content: text,
        metadata: ChunkMetadata {
            language,
            splitter: SplitterKind::Structural,
            symbol,
        },
        vector: None,
    }
}

fn extension_of(relative_path: &str) -> String {
    relative_path
        .rsplit_once('.')
        .map(|(_, ext)| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn chunk_id(relative_path: &str, start_line: u32, end_line: u32, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest_hex = format!("{:x}", hasher.finalize());
    format!("{relative_path}:{start_line}-{end_line}:{}", &digest_hex[..16])
}
