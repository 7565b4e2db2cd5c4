//! Merkle root over a codebase's file-hash map.

use crate::domain::types::FileHashMap;
use sha2::{Digest, Sha256};

/// Compute the Merkle root: a SHA-256 digest over every `path\0hash\0` pair,
/// concatenated in sorted path order (the map is already a `BTreeMap`, so
/// iteration order is deterministic).
pub fn compute_root(file_hashes: &FileHashMap) -> String {
    let mut hasher = Sha256::new();
    for (path, hash) in file_hashes {
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        hasher.update(hash.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_order_independent_at_the_map_level() {
        let mut a = FileHashMap::new();
        a.insert("b.rs".to_string(), "hash-b".to_string());
        a.insert("a.rs".to_string(), "hash-a".to_string());

        let mut b = FileHashMap::new();
        b.insert("a.rs".to_string(), "hash-a".to_string());
        b.insert("b.rs".to_string(), "hash-b".to_string());

        assert_eq!(compute_root(&a), compute_root(&b));
    }

    #[test]
    fn differs_when_any_hash_changes() {
        let mut a = FileHashMap::new();
        a.insert("a.rs".to_string(), "hash-a".to_string());
        let mut b = a.clone();
        b.insert("a.rs".to_string(), "hash-a-modified".to_string());

        assert_ne!(compute_root(&a), compute_root(&b));
    }

    #[test]
    fn empty_map_has_a_stable_root() {
        assert_eq!(compute_root(&FileHashMap::new()), compute_root(&FileHashMap::new()));
    }
}
