//! Character-based size+overlap splitter, used per-file whenever the
//! structural splitter has no grammar for a language, or its parse yields
//! no usable definitions.

use crate::domain::types::{Chunk, ChunkMetadata, Language, SplitterKind};
use sha2::{Digest, Sha256};

/// Target chunk size, in characters.
const CHUNK_SIZE: usize = 2500;
/// Overlap carried from the end of one chunk into the start of the next.
const CHUNK_OVERLAP: usize = 300;

/// Splits source text into fixed-size, overlapping windows, snapped to
/// line boundaries so a chunk never starts or ends mid-line.
#[derive(Debug)]
pub struct FallbackSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for FallbackSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackSplitter {
    /// Construct a fallback splitter using the default chunk budget.
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_overlap: CHUNK_OVERLAP,
        }
    }

    /// Construct a fallback splitter with a configured chunk budget.
    pub fn with_budget(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `content` into overlapping, newline-snapped chunks.
    pub fn split(&self, relative_path: &str, content: &str, language: Language) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let lines: Vec<&str> = content.lines().collect();
        let file_extension = extension_of(relative_path);
        let mut chunks = Vec::new();
        let mut start_idx = 0usize;

        while start_idx < lines.len() {
            let mut char_count = 0usize;
            let mut end_idx = start_idx;
            while end_idx < lines.len() && char_count < self.chunk_size {
                char_count += lines[end_idx].chars().count() + 1;
                end_idx += 1;
            }
            // Always include at least one line so we make forward progress.
            end_idx = end_idx.max(start_idx + 1).min(lines.len());

            let text = lines[start_idx..end_idx].join("\n");
            let start_line = start_idx as u32 + 1;
            let end_line = end_idx as u32;

            chunks.push(Chunk {
                id: chunk_id(relative_path, start_line, end_line, &text),
                relative_path: relative_path.to_string(),
                start_line,
                end_line,
                file_extension: file_extension.clone(),
                content: text,
                metadata: ChunkMetadata {
                    language,
                    splitter: SplitterKind::Fallback,
                    symbol: None,
                },
                vector: None,
            });

            if end_idx >= lines.len() {
                break;
            }

            // Back up by overlap characters, snapped to a line boundary.
            let mut overlap_chars = 0usize;
            let mut new_start = end_idx;
            while new_start > start_idx && overlap_chars < self.chunk_overlap {
                new_start -= 1;
                overlap_chars += lines[new_start].chars().count() + 1;
            }
            start_idx = new_start.max(start_idx + 1);
        }

        chunks
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_long_file_with_overlap() {
        let content: String = (0..500).map(|i| format!("line {i}\n")).collect();
        let splitter = FallbackSplitter::new();
        let chunks = splitter.split("big.txt", &content, Language::Unknown);
        assert!(chunks.len() > 1);
        // consecutive chunks overlap: second chunk's start line is before the first's end line
        assert!(chunks[1].start_line <= chunks[0].end_line);
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let splitter = FallbackSplitter::new();
        assert!(splitter.split("empty.txt", "   \n  ", Language::Unknown).is_empty());
    }

    #[test]
    fn small_file_is_a_single_chunk() {
        let splitter = FallbackSplitter::new();
        let chunks = splitter.split("small.rs", "fn main() {}\n", Language::Rust);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
    }
}
