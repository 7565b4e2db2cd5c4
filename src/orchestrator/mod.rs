//! Index orchestrator: the engine's public API. Owns the embedding
//! provider, splitter, and path registry, and coordinates preparation,
//! full/incremental indexing, and search against one [`SqliteVectorStore`]
//! per codebase.

pub mod state;

use crate::adapters::providers::embedding::retry;
use crate::adapters::providers::vector_store::SqliteVectorStore;
use crate::config::EngineConfig;
use crate::domain::error::{Error, Result};
use crate::domain::ports::{CodeSplitter, EmbeddingProvider, VectorStoreProvider};
use crate::domain::types::{
    Chunk, CodebaseState, CollectionMode, FilterExpr, IndexStatus, IndexingStats, Language,
    ProgressPhase, ProgressUpdate, SearchHit, SyncCounts,
};
use crate::ignore::IgnoreRules;
use crate::registry::PathRegistry;
use crate::sync::FileSynchronizer;
use arc_swap::ArcSwap;
use state::CodebaseStateTracker;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Caller-supplied progress callback. Invoked at batch boundaries; any
/// panic it raises is swallowed rather than propagated.
pub type ProgressCb<'a> = &'a (dyn Fn(ProgressUpdate) + Send + Sync);

/// Coordinates the path registry, embedding provider, splitter, ignore
/// rules, and vector store to implement indexing and search for any number
/// of codebases, one store open at a time.
pub struct IndexOrchestrator {
    registry: PathRegistry,
    config: ArcSwap<EngineConfig>,
    embedder: ArcSwap<dyn EmbeddingProvider>,
    splitter: ArcSwap<dyn CodeSplitter>,
    states: Arc<CodebaseStateTracker>,
    active_store: AsyncMutex<Option<(String, Arc<SqliteVectorStore>)>>,
}

impl IndexOrchestrator {
    /// Construct an orchestrator over `registry`, starting from `config`,
    /// `embedder`, and `splitter`. Any of the three can be swapped later
    /// via the `set_*` methods; the change applies to subsequent
    /// operations only.
    pub fn new(
        registry: PathRegistry,
        config: EngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        splitter: Arc<dyn CodeSplitter>,
    ) -> Self {
        Self {
            registry,
            config: ArcSwap::from_pointee(config),
            embedder: ArcSwap::from(embedder),
            splitter: ArcSwap::from(splitter),
            states: Arc::new(CodebaseStateTracker::new()),
            active_store: AsyncMutex::new(None),
        }
    }

    /// Swap the embedding provider used by subsequent operations.
    pub fn set_embedder(&self, embedder: Arc<dyn EmbeddingProvider>) {
        self.embedder.store(embedder);
    }

    /// Swap the code splitter used by subsequent operations.
    pub fn set_splitter(&self, splitter: Arc<dyn CodeSplitter>) {
        self.splitter.store(splitter);
    }

    /// Replace the extra ignore patterns applied on top of the built-in
    /// and `.gitignore` rules.
    pub fn set_ignore_patterns(&self, patterns: Vec<String>) {
        let mut next = (**self.config.load()).clone();
        next.ignore.extra_patterns = patterns;
        self.config.store(Arc::new(next));
    }

    /// Observable state of the codebase rooted at `path`.
    pub fn state_of(&self, path: &Path) -> Result<CodebaseState> {
        let id = self.registry.id_for(path)?;
        Ok(self.states.state_of(&id))
    }

    /// Whether a collection already exists for `path`, without opening it.
    pub fn has_index(&self, path: &Path) -> Result<bool> {
        let id = self.registry.id_for(path)?;
        Ok(self.registry.db_path_for(&id).exists())
    }

    /// Full or incremental-from-scratch indexing of the codebase rooted at
    /// `path`. `force` drops any existing content before reindexing.
    #[tracing::instrument(skip(self, progress_cb), fields(path = %path.display()))]
    pub async fn index_codebase(
        &self,
        path: &Path,
        progress_cb: Option<ProgressCb<'_>>,
        force: bool,
    ) -> Result<IndexingStats> {
        let id = self.registry.id_for(path)?;
        let _guard = self.states.acquire_writer(&id)?;
        self.states.set_state(&id, CodebaseState::Preparing);

        let cfg = (**self.config.load()).clone();
        let dimension = self.dimension_for_embedder(&cfg)?;
        let mode = if cfg.search.hybrid {
            CollectionMode::Hybrid
        } else {
            CollectionMode::Dense
        };

        let store = self.store_for(&id).await?;
        store.ensure_collection(dimension, mode).await?;
        if force {
            store.clear().await?;
        }

        self.states.set_state(&id, CodebaseState::Indexing);

        let rules = IgnoreRules::build(path, &cfg.ignore.extra_patterns);
        let snapshot = FileSynchronizer::scan(path, |p| rules.include(p))?;
        emit_progress(progress_cb, ProgressPhase::Discovering, 0, snapshot.file_hashes.len());

        let all_paths: Vec<String> = snapshot.file_hashes.keys().cloned().collect();
        let mut total_chunks = if force { 0 } else { store.count().await? };

        let (status, completed_paths) = self
            .index_paths(path, &all_paths, &store, &cfg, &mut total_chunks, progress_cb)
            .await?;

        let snapshot_path = self.registry.snapshot_path_for(&id);
        let snapshot_to_save = if status == IndexStatus::LimitReached {
            FileSynchronizer::restrict(&snapshot, &completed_paths)
        } else {
            snapshot
        };
        FileSynchronizer::save(&snapshot_path, &snapshot_to_save)?;

        self.states.set_state(
            &id,
            match status {
                IndexStatus::Completed => CodebaseState::Completed,
                IndexStatus::LimitReached => CodebaseState::LimitReached,
            },
        );

        Ok(IndexingStats {
            indexed_files: all_paths.len(),
            total_chunks,
            status,
        })
    }

    /// Incremental reindex: diff the current tree against the last saved
    /// snapshot, delete chunks for removed/modified files, re-embed and
    /// upsert chunks for added/modified files.
    #[tracing::instrument(skip(self, progress_cb), fields(path = %path.display()))]
    pub async fn reindex_by_change(
        &self,
        path: &Path,
        progress_cb: Option<ProgressCb<'_>>,
    ) -> Result<SyncCounts> {
        let id = self.registry.id_for(path)?;
        let _guard = self.states.acquire_writer(&id)?;
        self.states.set_state(&id, CodebaseState::Indexing);

        let cfg = (**self.config.load()).clone();
        let rules = IgnoreRules::build(path, &cfg.ignore.extra_patterns);
        let curr = FileSynchronizer::scan(path, |p| rules.include(p))?;
        let snapshot_path = self.registry.snapshot_path_for(&id);
        let prev = FileSynchronizer::load(&snapshot_path)?;
        let diff = FileSynchronizer::diff(&prev, &curr);

        let store = self.store_for(&id).await?;

        let mut to_delete = diff.removed.clone();
        to_delete.extend(diff.modified.iter().cloned());
        if !to_delete.is_empty() {
            store.delete_paths(&to_delete).await?;
        }

        let mut to_reindex = diff.added.clone();
        to_reindex.extend(diff.modified.iter().cloned());
        to_reindex.sort();

        let mut total_chunks = store.count().await?;
        let (status, completed_paths) = self
            .index_paths(path, &to_reindex, &store, &cfg, &mut total_chunks, progress_cb)
            .await?;

        let snapshot_to_save = if status == IndexStatus::LimitReached {
            let mut keep: Vec<String> = prev
                .file_hashes
                .keys()
                .filter(|p| !to_delete.contains(p))
                .cloned()
                .collect();
            keep.extend(completed_paths);
            keep.sort();
            keep.dedup();
            FileSynchronizer::restrict(&curr, &keep)
        } else {
            curr
        };
        FileSynchronizer::save(&snapshot_path, &snapshot_to_save)?;
        self.states.set_state(&id, CodebaseState::Completed);

        Ok(SyncCounts {
            added: diff.added.len(),
            modified: diff.modified.len(),
            removed: diff.removed.len(),
        })
    }

    /// Embed `query` and search the codebase rooted at `path`, routing to
    /// hybrid or dense search depending on configuration and whether
    /// `query` carries lexical content.
    #[tracing::instrument(skip(self, filter), fields(path = %path.display()))]
    pub async fn semantic_search(
        &self,
        path: &Path,
        query: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<SearchHit>> {
        if !self.has_index(path)? {
            return Err(Error::NotIndexed);
        }

        let cfg = (**self.config.load()).clone();
        let id = self.registry.id_for(path)?;
        let store = self.store_for(&id).await?;

        let top_k = top_k.unwrap_or(cfg.search.default_top_k);
        let threshold = threshold.unwrap_or(cfg.search.default_threshold);

        let embedder = self.embedder.load_full();
        let query_vector = embedder.embed(query).await?;

        let hits = if cfg.search.hybrid && !query.trim().is_empty() {
            store.set_rrf_k(cfg.search.rrf_k);
            store.search_hybrid(&query_vector, query, top_k, filter).await?
        } else {
            store.search_dense(&query_vector, top_k, filter).await?
        };

        Ok(hits.into_iter().filter(|hit| hit.score >= threshold).collect())
    }

    /// Drop the collection, store file, snapshot, and path mapping for the
    /// codebase rooted at `path`, returning it to the `Absent` state. A
    /// subsequent `has_index` / `semantic_search` sees it as never indexed.
    pub async fn clear_index(&self, path: &Path, progress_cb: Option<ProgressCb<'_>>) -> Result<()> {
        let id = self.registry.id_for(path)?;
        let _guard = self.states.acquire_writer(&id)?;
        self.states.set_state(&id, CodebaseState::Clearing);

        {
            let mut slot = self.active_store.lock().await;
            if matches!(slot.as_ref(), Some((active_id, _)) if active_id == &id) {
                *slot = None;
            }
        }

        self.registry.remove(&id)?;
        emit_progress(progress_cb, ProgressPhase::Storing, 1, 1);

        self.states.set_state(&id, CodebaseState::Absent);
        Ok(())
    }

    fn dimension_for_embedder(&self, cfg: &EngineConfig) -> Result<usize> {
        if cfg.embedding.dimensions > 0 {
            return Ok(cfg.embedding.dimensions);
        }
        let dimension = self.embedder.load().dimensions();
        if dimension == 0 {
            return Err(Error::config(
                "embedding provider returned an unknown dimension and no override is configured",
            ));
        }
        Ok(dimension)
    }

    /// Return the store for `id`, opening it if it is not the currently
    /// active one. At most one store is held open at a time.
    async fn store_for(&self, id: &str) -> Result<Arc<SqliteVectorStore>> {
        let mut slot = self.active_store.lock().await;
        if let Some((active_id, store)) = slot.as_ref() {
            if active_id == id {
                return Ok(store.clone());
            }
        }
        let db_path = self.registry.db_path_for(id);
        let store = Arc::new(SqliteVectorStore::open(db_path)?);
        *slot = Some((id.to_string(), store.clone()));
        Ok(store)
    }

    /// Chunk, embed, and upsert every path in `relative_paths`, batching by
    /// `cfg.indexing.batch_size` and enforcing `cfg.indexing.max_chunks`.
    /// Returns the paths that ended up fully represented in the store — on
    /// [`IndexStatus::Completed`] that's every path with content; on
    /// [`IndexStatus::LimitReached`] it excludes any file whose chunks were
    /// cut off by the cap, so callers can persist a snapshot that matches
    /// what was actually written.
    async fn index_paths(
        &self,
        root: &Path,
        relative_paths: &[String],
        store: &Arc<SqliteVectorStore>,
        cfg: &EngineConfig,
        total_chunks: &mut usize,
        progress_cb: Option<ProgressCb<'_>>,
    ) -> Result<(IndexStatus, Vec<String>)> {
        let splitter = self.splitter.load_full();
        let total = relative_paths.len();
        let mut batch: Vec<Chunk> = Vec::new();
        let mut batch_files: Vec<(String, usize)> = Vec::new();
        let mut completed_paths: Vec<String> = Vec::new();

        for (index, relative_path) in relative_paths.iter().enumerate() {
            let full_path = root.join(relative_path);
            let content = match std::fs::read_to_string(&full_path) {
                Ok(content) => content,
                Err(_) => continue,
            };

            let extension = extension_of(relative_path);
            let language = Language::from_extension(&extension);
            let chunks = splitter.split(relative_path, &content, language);
            if chunks.is_empty() {
                completed_paths.push(relative_path.clone());
                continue;
            }
            batch_files.push((relative_path.clone(), chunks.len()));
            batch.extend(chunks);

            let is_last_file = index + 1 == total;
            if batch.len() < cfg.indexing.batch_size && !is_last_file {
                continue;
            }

            if *total_chunks + batch.len() > cfg.indexing.max_chunks {
                let remaining = cfg.indexing.max_chunks.saturating_sub(*total_chunks);
                batch.truncate(remaining);

                let mut committed = 0usize;
                for (file_path, count) in &batch_files {
                    if committed + count > remaining {
                        break;
                    }
                    committed += count;
                    completed_paths.push(file_path.clone());
                }

                self.embed_and_upsert(store, &mut batch).await?;
                *total_chunks += batch.len();
                emit_progress(progress_cb, ProgressPhase::Storing, index + 1, total);
                return Ok((IndexStatus::LimitReached, completed_paths));
            }

            self.embed_and_upsert(store, &mut batch).await?;
            *total_chunks += batch.len();
            completed_paths.extend(batch_files.drain(..).map(|(path, _)| path));
            batch.clear();
            emit_progress(progress_cb, ProgressPhase::Storing, index + 1, total);
        }

        Ok((IndexStatus::Completed, completed_paths))
    }

    async fn embed_and_upsert(&self, store: &Arc<SqliteVectorStore>, batch: &mut [Chunk]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let embedder = self.embedder.load_full();
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();

        let vectors = match embedder.embed_batch(&texts).await {
            Ok(vectors) => vectors,
            Err(Error::Embedding { provider, message }) if retry::looks_oversize(&message) => {
                let Some(limit) = embedder.max_input_tokens() else {
                    return Err(Error::embedding(provider, message));
                };
                tracing::warn!(provider = %provider, limit, "oversize input, truncating and resubmitting once");
                let truncated: Vec<String> = texts
                    .iter()
                    .map(|text| text.chars().take(limit).collect())
                    .collect();
                embedder.embed_batch(&truncated).await.map_err(|_| {
                    Error::embedding(
                        provider,
                        format!("input still oversize after truncation to {limit} characters: {message}"),
                    )
                })?
            }
            Err(err) => return Err(err),
        };

        for (chunk, vector) in batch.iter_mut().zip(vectors.into_iter()) {
            chunk.vector = Some(vector);
        }
        store.upsert(batch).await
    }
}

fn extension_of(relative_path: &str) -> String {
    relative_path
        .rsplit_once('.')
        .map(|(_, ext)| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn emit_progress(progress_cb: Option<ProgressCb<'_>>, phase: ProgressPhase, current: usize, total: usize) {
    let Some(cb) = progress_cb else { return };
    let percentage = if total == 0 {
        100.0
    } else {
        (current as f32 / total as f32) * 100.0
    };
    let update = ProgressUpdate {
        phase,
        current,
        total,
        percentage,
    };
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(update)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::embedding::NullEmbeddingProvider;
    use crate::chunking::HybridSplitter;
    use crate::config::loader::ConfigLoader;
    use tempfile::tempdir;

    async fn test_orchestrator(storage_root: std::path::PathBuf) -> IndexOrchestrator {
        let config = ConfigLoader::new().load_embedded_defaults_only().await.unwrap();
        let registry = PathRegistry::with_storage_root(storage_root);
        IndexOrchestrator::new(
            registry,
            config,
            Arc::new(NullEmbeddingProvider::new()),
            Arc::new(HybridSplitter::new()),
        )
    }

    #[tokio::test]
    async fn index_then_search_round_trips() {
        let codebase = tempdir().unwrap();
        let storage = tempdir().unwrap();
        std::fs::write(codebase.path().join("main.rs"), "fn hello() { println!(\"hi\"); }\n").unwrap();

        let orchestrator = test_orchestrator(storage.path().to_path_buf()).await;
        let stats = orchestrator
            .index_codebase(codebase.path(), None, false)
            .await
            .unwrap();
        assert_eq!(stats.status, IndexStatus::Completed);
        assert!(stats.total_chunks > 0);

        let hits = orchestrator
            .semantic_search(codebase.path(), "hello", None, Some(0.0), None)
            .await
            .unwrap();
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn search_before_index_is_not_indexed() {
        let codebase = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let orchestrator = test_orchestrator(storage.path().to_path_buf()).await;

        let result = orchestrator.semantic_search(codebase.path(), "hello", None, None, None).await;
        assert!(matches!(result, Err(Error::NotIndexed)));
    }

    #[tokio::test]
    async fn reindex_by_change_reports_added_modified_removed() {
        let codebase = tempdir().unwrap();
        let storage = tempdir().unwrap();
        std::fs::write(codebase.path().join("a.rs"), "fn a() {}\n").unwrap();
        std::fs::write(codebase.path().join("b.rs"), "fn b() {}\n").unwrap();

        let orchestrator = test_orchestrator(storage.path().to_path_buf()).await;
        orchestrator.index_codebase(codebase.path(), None, false).await.unwrap();

        std::fs::remove_file(codebase.path().join("b.rs")).unwrap();
        std::fs::write(codebase.path().join("a.rs"), "fn a() { changed(); }\n").unwrap();
        std::fs::write(codebase.path().join("c.rs"), "fn c() {}\n").unwrap();

        let counts = orchestrator.reindex_by_change(codebase.path(), None).await.unwrap();
        assert_eq!(counts.added, 1);
        assert_eq!(counts.modified, 1);
        assert_eq!(counts.removed, 1);
    }

    #[tokio::test]
    async fn clear_index_makes_has_index_false() {
        let codebase = tempdir().unwrap();
        let storage = tempdir().unwrap();
        std::fs::write(codebase.path().join("main.rs"), "fn hello() {}\n").unwrap();

        let orchestrator = test_orchestrator(storage.path().to_path_buf()).await;
        orchestrator.index_codebase(codebase.path(), None, false).await.unwrap();
        assert!(orchestrator.has_index(codebase.path()).unwrap());

        orchestrator.clear_index(codebase.path(), None).await.unwrap();
        assert!(!orchestrator.has_index(codebase.path()).unwrap());

        let result = orchestrator.semantic_search(codebase.path(), "hello", None, None, None).await;
        assert!(matches!(result, Err(Error::NotIndexed)));
    }

    #[tokio::test]
    async fn limit_reached_snapshot_only_records_completed_files() {
        let codebase = tempdir().unwrap();
        let storage = tempdir().unwrap();
        std::fs::write(codebase.path().join("a.rs"), "fn a() {}\n").unwrap();
        std::fs::write(codebase.path().join("b.rs"), "fn b() {}\n").unwrap();

        let mut config = ConfigLoader::new().load_embedded_defaults_only().await.unwrap();
        config.indexing.max_chunks = 1;
        config.indexing.batch_size = 1;
        let registry = PathRegistry::with_storage_root(storage.path().to_path_buf());
        let orchestrator = IndexOrchestrator::new(
            registry,
            config,
            Arc::new(NullEmbeddingProvider::new()),
            Arc::new(HybridSplitter::new()),
        );

        let stats = orchestrator.index_codebase(codebase.path(), None, false).await.unwrap();
        assert_eq!(stats.status, IndexStatus::LimitReached);

        let counts = orchestrator.reindex_by_change(codebase.path(), None).await.unwrap();
        assert_eq!(counts.added, 1);
        assert_eq!(counts.modified, 0);
        assert_eq!(counts.removed, 0);
    }
}
