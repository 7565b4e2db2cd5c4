//! File synchronizer: hashes a codebase's files, tracks them in a
//! [`CodebaseSnapshot`], and diffs two snapshots into
//! added/modified/removed sets for incremental indexing.

/// Merkle root computation over a file-hash map
pub mod merkle;

use crate::domain::error::{Error, Result};
use crate::domain::types::{CodebaseSnapshot, FileHashMap, SnapshotDiff};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Walks a codebase root and hashes every file the caller's predicate
/// accepts, producing a [`CodebaseSnapshot`].
pub struct FileSynchronizer;

impl FileSynchronizer {
    /// Walk `root`, hashing every file for which `include` returns `true`.
    /// Paths in the resulting snapshot are relative to `root`, using `/`
    /// separators regardless of platform.
    pub fn scan(root: &Path, include: impl Fn(&Path) -> bool) -> Result<CodebaseSnapshot> {
        let mut file_hashes = FileHashMap::new();
        let mut discovered = 0usize;

        for entry in walkdir::WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !include(path) {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            let hash = hash_file(path)?;
            file_hashes.insert(relative, hash);
            discovered += 1;
        }

        tracing::info!(discovered, "file synchronizer scan complete");
        let merkle_root = merkle::compute_root(&file_hashes);
        Ok(CodebaseSnapshot {
            file_hashes,
            merkle_root,
        })
    }

    /// Diff `previous` against `current`, relative to `previous`.
    pub fn diff(previous: &CodebaseSnapshot, current: &CodebaseSnapshot) -> SnapshotDiff {
        let mut added = Vec::new();
        let mut modified = Vec::new();
        let mut removed = Vec::new();

        for (path, hash) in &current.file_hashes {
            match previous.file_hashes.get(path) {
                None => added.push(path.clone()),
                Some(old_hash) if old_hash != hash => modified.push(path.clone()),
                _ => {}
            }
        }
        for path in previous.file_hashes.keys() {
            if !current.file_hashes.contains_key(path) {
                removed.push(path.clone());
            }
        }

        added.sort();
        modified.sort();
        removed.sort();
        SnapshotDiff {
            added,
            modified,
            removed,
        }
    }

    /// Load a previously persisted snapshot from `path`. Returns the
    /// default (empty) snapshot if the file does not exist yet.
    pub fn load(path: &Path) -> Result<CodebaseSnapshot> {
        if !path.exists() {
            return Ok(CodebaseSnapshot::default());
        }
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Build a snapshot containing only the hashes for `keep`, recomputing
    /// the Merkle root over that subset. Used when indexing stops early
    /// (hard cap) so the persisted snapshot records only the files that are
    /// actually fully represented in the store.
    pub fn restrict(snapshot: &CodebaseSnapshot, keep: &[String]) -> CodebaseSnapshot {
        let mut file_hashes = FileHashMap::new();
        for path in keep {
            if let Some(hash) = snapshot.file_hashes.get(path) {
                file_hashes.insert(path.clone(), hash.clone());
            }
        }
        let merkle_root = merkle::compute_root(&file_hashes);
        CodebaseSnapshot {
            file_hashes,
            merkle_root,
        }
    }

    /// Persist `snapshot` to `path`, writing to a temp file first and
    /// renaming into place so a crash never leaves a half-written snapshot.
    pub fn save(path: &Path, snapshot: &CodebaseSnapshot) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path: PathBuf = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, path).map_err(Error::Io)?;
        Ok(())
    }
}

fn hash_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_hashes_every_included_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), b"fn a() {}").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"not code").unwrap();

        let snapshot =
            FileSynchronizer::scan(dir.path(), |p| p.extension().map(|e| e == "rs").unwrap_or(false))
                .unwrap();

        assert_eq!(snapshot.file_hashes.len(), 1);
        assert!(snapshot.file_hashes.contains_key("a.rs"));
    }

    #[test]
    fn diff_detects_added_modified_removed() {
        let mut previous = FileHashMap::new();
        previous.insert("a.rs".to_string(), "h1".to_string());
        previous.insert("b.rs".to_string(), "h2".to_string());
        let previous = CodebaseSnapshot {
            merkle_root: merkle::compute_root(&previous),
            file_hashes: previous,
        };

        let mut current = FileHashMap::new();
        current.insert("a.rs".to_string(), "h1-changed".to_string());
        current.insert("c.rs".to_string(), "h3".to_string());
        let current = CodebaseSnapshot {
            merkle_root: merkle::compute_root(&current),
            file_hashes: current,
        };

        let diff = FileSynchronizer::diff(&previous, &current);
        assert_eq!(diff.added, vec!["c.rs".to_string()]);
        assert_eq!(diff.modified, vec!["a.rs".to_string()]);
        assert_eq!(diff.removed, vec!["b.rs".to_string()]);
    }

    #[test]
    fn restrict_keeps_only_the_named_paths() {
        let mut hashes = FileHashMap::new();
        hashes.insert("a.rs".to_string(), "h1".to_string());
        hashes.insert("b.rs".to_string(), "h2".to_string());
        let snapshot = CodebaseSnapshot {
            merkle_root: merkle::compute_root(&hashes),
            file_hashes: hashes,
        };

        let restricted = FileSynchronizer::restrict(&snapshot, &["a.rs".to_string()]);
        assert_eq!(restricted.file_hashes.len(), 1);
        assert!(restricted.file_hashes.contains_key("a.rs"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merkle").join("abc123.json");
        let mut hashes = FileHashMap::new();
        hashes.insert("a.rs".to_string(), "h1".to_string());
        let snapshot = CodebaseSnapshot {
            merkle_root: merkle::compute_root(&hashes),
            file_hashes: hashes,
        };

        FileSynchronizer::save(&path, &snapshot).unwrap();
        let loaded = FileSynchronizer::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }
}
