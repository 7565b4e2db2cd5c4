//! Path registry: maps an absolute codebase path to a stable short id and
//! to the on-disk location of its vector store file.

use crate::domain::error::Result;
use crate::domain::types::RegistryEntry;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

/// Default storage root, under the user's home directory.
fn default_storage_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".code-context")
        .join("vectors")
}

/// Resolves codebase paths to ids and to per-codebase store files.
pub struct PathRegistry {
    storage_root: PathBuf,
}

impl PathRegistry {
    /// Build a registry rooted at the default storage location, unless the
    /// `VECTOR_DB_PATH` environment variable overrides it.
    pub fn new() -> Self {
        let storage_root = std::env::var("VECTOR_DB_PATH")
            .map(|raw| PathBuf::from(shellexpand::tilde(&raw).into_owned()))
            .unwrap_or_else(|_| default_storage_root());
        Self { storage_root }
    }

    /// Build a registry rooted at an explicit directory, bypassing the
    /// environment override. Used by tests.
    pub fn with_storage_root(storage_root: PathBuf) -> Self {
        Self { storage_root }
    }

    /// Derive the stable id for `codebase_path`: the first 8 hex
    /// characters of the MD5 digest of its canonicalized absolute path.
    /// Also records the `id -> path` mapping in `path-mappings.json` so the
    /// on-disk layout stays self-describing.
    pub fn id_for(&self, codebase_path: &Path) -> Result<String> {
        let absolute = codebase_path
            .canonicalize()
            .unwrap_or_else(|_| codebase_path.to_path_buf());
        let mut hasher = Md5::new();
        hasher.update(absolute.to_string_lossy().as_bytes());
        let digest = hasher.finalize();
        let id = format!("{:x}", digest)[..8].to_string();
        self.record_mapping(&id, &absolute)?;
        Ok(id)
    }

    /// Path to the `id -> absolute path` mapping file.
    fn path_mappings_file(&self) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".code-context")
            .join("path-mappings.json")
    }

    fn record_mapping(&self, id: &str, absolute_path: &Path) -> Result<()> {
        let mappings_path = self.path_mappings_file();
        let mut mappings = self.load_mappings()?;
        mappings.insert(id.to_string(), absolute_path.to_string_lossy().into_owned());
        if let Some(parent) = mappings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = mappings_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(&mappings)?)?;
        std::fs::rename(&tmp_path, &mappings_path)?;
        Ok(())
    }

    fn load_mappings(&self) -> Result<std::collections::BTreeMap<String, String>> {
        let mappings_path = self.path_mappings_file();
        if !mappings_path.exists() {
            return Ok(std::collections::BTreeMap::new());
        }
        let bytes = std::fs::read(&mappings_path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Resolve a previously registered id back to its absolute codebase
    /// path, if recorded.
    pub fn resolve(&self, id: &str) -> Result<Option<PathBuf>> {
        Ok(self.load_mappings()?.get(id).map(PathBuf::from))
    }

    /// Path to the SQLite store file for `id`.
    pub fn db_path_for(&self, id: &str) -> PathBuf {
        self.storage_root.join(format!("{id}.db"))
    }

    /// Path to the persisted Merkle snapshot for `id`.
    pub fn snapshot_path_for(&self, id: &str) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".code-context")
            .join("merkle")
            .join(format!("{id}.json"))
    }

    /// List every codebase currently registered, by scanning the storage
    /// root for `*.db` files.
    pub fn list(&self) -> Result<Vec<RegistryEntry>> {
        if !self.storage_root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.storage_root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("db") {
                continue;
            }
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let metadata = entry.metadata()?;
            let modified_at = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            entries.push(RegistryEntry {
                id,
                path: path.clone(),
                size_bytes: metadata.len(),
                modified_at,
            });
        }
        Ok(entries)
    }

    /// Remove the store file and snapshot for `id`, if present.
    pub fn remove(&self, id: &str) -> Result<()> {
        let db_path = self.db_path_for(id);
        if db_path.exists() {
            std::fs::remove_file(&db_path)?;
        }
        for ext in ["-wal", "-shm"] {
            let sidecar = PathBuf::from(format!("{}{ext}", db_path.display()));
            if sidecar.exists() {
                std::fs::remove_file(sidecar)?;
            }
        }
        let snapshot_path = self.snapshot_path_for(id);
        if snapshot_path.exists() {
            std::fs::remove_file(snapshot_path)?;
        }
        self.forget_mapping(id)?;
        Ok(())
    }

    /// Remove `id`'s entry from `path-mappings.json`, if present.
    fn forget_mapping(&self, id: &str) -> Result<()> {
        let mut mappings = self.load_mappings()?;
        if mappings.remove(id).is_none() {
            return Ok(());
        }
        let mappings_path = self.path_mappings_file();
        if let Some(parent) = mappings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = mappings_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(&mappings)?)?;
        std::fs::rename(&tmp_path, &mappings_path)?;
        Ok(())
    }

    /// Remove store files that no longer correspond to an existing
    /// codebase path, given the set of ids the caller still considers live.
    pub fn cleanup_orphans(&self, live_ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for entry in self.list()? {
            if !live_ids.contains(&entry.id) {
                self.remove(&entry.id)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl Default for PathRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn id_for_is_stable_for_the_same_path() {
        let dir = tempdir().unwrap();
        let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());
        let id1 = registry.id_for(dir.path()).unwrap();
        let id2 = registry.id_for(dir.path()).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 8);
    }

    #[test]
    #[serial]
    fn list_finds_registered_db_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("abcd1234.db"), b"").unwrap();
        let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());
        let entries = registry.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "abcd1234");
    }

    #[test]
    #[serial]
    fn remove_deletes_the_store_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("abcd1234.db"), b"").unwrap();
        let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());
        registry.remove("abcd1234").unwrap();
        assert!(!dir.path().join("abcd1234.db").exists());
    }

    #[test]
    #[serial]
    fn id_for_records_a_resolvable_path_mapping() {
        let dir = tempdir().unwrap();
        let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());
        let id = registry.id_for(dir.path()).unwrap();
        let resolved = registry.resolve(&id).unwrap();
        assert_eq!(resolved.unwrap(), dir.path().canonicalize().unwrap());
    }

    #[test]
    #[serial]
    fn remove_forgets_the_path_mapping() {
        let dir = tempdir().unwrap();
        let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());
        let id = registry.id_for(dir.path()).unwrap();
        registry.remove(&id).unwrap();
        assert!(registry.resolve(&id).unwrap().is_none());
    }

    #[test]
    #[serial]
    fn resolve_is_none_for_an_unknown_id() {
        let dir = tempdir().unwrap();
        let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());
        assert!(registry.resolve("00000000").unwrap().is_none());
    }
}
