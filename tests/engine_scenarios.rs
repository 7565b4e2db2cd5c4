//! Integration tests exercising the concrete scenarios the engine's
//! components are expected to satisfy end to end.

use codesearch_engine::adapters::providers::embedding::NullEmbeddingProvider;
use codesearch_engine::adapters::providers::vector_store::SqliteVectorStore;
use codesearch_engine::chunking::HybridSplitter;
use codesearch_engine::config::loader::ConfigLoader;
use codesearch_engine::domain::ports::VectorStoreProvider;
use codesearch_engine::registry::PathRegistry;
use codesearch_engine::{
    Chunk, ChunkMetadata, CollectionMode, FilterExpr, FilterField, IndexStatus, IndexOrchestrator,
    Language, SplitterKind,
};
use md5::{Digest, Md5};
use std::sync::Arc;
use tempfile::tempdir;

async fn orchestrator_with_cap(storage_root: std::path::PathBuf, max_chunks: usize) -> IndexOrchestrator {
    let mut config = ConfigLoader::new().load_embedded_defaults_only().await.unwrap();
    config.indexing.max_chunks = max_chunks;
    config.indexing.batch_size = 5;
    let registry = PathRegistry::with_storage_root(storage_root);
    IndexOrchestrator::new(
        registry,
        config,
        Arc::new(NullEmbeddingProvider::new()),
        Arc::new(HybridSplitter::new()),
    )
}

fn chunk(path: &str, extension: &str, line: u32, vector: Vec<f32>) -> Chunk {
    Chunk {
        id: format!("{path}:{line}"),
        relative_path: path.to_string(),
        start_line: line,
        end_line: line,
        file_extension: extension.to_string(),
        content: format!("content of {path} at {line}"),
        metadata: ChunkMetadata {
            language: Language::from_extension(extension),
            splitter: SplitterKind::Fallback,
            symbol: None,
        },
        vector: Some(vector),
    }
}

#[test]
fn scenario_1_id_determinism_matches_raw_md5() {
    let dir = tempdir().unwrap();
    let registry = PathRegistry::with_storage_root(dir.path().to_path_buf());

    let id = registry.id_for(dir.path()).unwrap();

    let canonical = dir.path().canonicalize().unwrap();
    let mut hasher = Md5::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let expected = format!("{:x}", hasher.finalize())[..8].to_string();

    assert_eq!(id, expected);
    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn scenario_3_full_then_incremental_drops_stale_hits() {
    let codebase = tempdir().unwrap();
    let storage = tempdir().unwrap();
    std::fs::write(codebase.path().join("a.rs"), "fn alpha() {}\n").unwrap();
    std::fs::write(codebase.path().join("b.rs"), "fn bravo_unique_token() {}\n").unwrap();
    std::fs::write(codebase.path().join("c.rs"), "fn charlie() {}\n").unwrap();

    let orchestrator = orchestrator_with_cap(storage.path().to_path_buf(), 450_000).await;
    let stats = orchestrator.index_codebase(codebase.path(), None, false).await.unwrap();
    assert_eq!(stats.indexed_files, 3);

    std::fs::remove_file(codebase.path().join("b.rs")).unwrap();
    std::fs::write(codebase.path().join("a.rs"), "fn alpha() { modified(); }\n").unwrap();
    std::fs::write(codebase.path().join("d.rs"), "fn delta() {}\n").unwrap();

    let counts = orchestrator.reindex_by_change(codebase.path(), None).await.unwrap();
    assert_eq!(counts.added, 1);
    assert_eq!(counts.modified, 1);
    assert_eq!(counts.removed, 1);

    let hits = orchestrator
        .semantic_search(codebase.path(), "bravo_unique_token", None, Some(0.0), None)
        .await
        .unwrap();
    assert!(hits.iter().all(|hit| hit.relative_path != "b.rs"));
}

#[tokio::test]
async fn scenario_5_hard_cap_truncates_and_reports_limit_reached() {
    let codebase = tempdir().unwrap();
    let storage = tempdir().unwrap();
    for i in 0..25 {
        std::fs::write(
            codebase.path().join(format!("file_{i}.rs")),
            format!("fn f{i}() {{}}\n"),
        )
        .unwrap();
    }

    let orchestrator = orchestrator_with_cap(storage.path().to_path_buf(), 10).await;
    let stats = orchestrator.index_codebase(codebase.path(), None, false).await.unwrap();

    assert_eq!(stats.status, IndexStatus::LimitReached);
    assert_eq!(stats.total_chunks, 10);
}

#[tokio::test]
async fn scenario_6_filter_restricts_results_to_matching_extension() {
    let storage = tempdir().unwrap();
    let db_path = storage.path().join("filter-test.db");
    let store = SqliteVectorStore::open(&db_path).unwrap();
    store.ensure_collection(3, CollectionMode::Dense).await.unwrap();

    let chunks = vec![
        chunk("a.ts", ".ts", 1, vec![1.0, 0.0, 0.0]),
        chunk("b.ts", ".ts", 1, vec![1.0, 0.0, 0.0]),
        chunk("c.py", ".py", 1, vec![1.0, 0.0, 0.0]),
    ];
    store.upsert(&chunks).await.unwrap();

    let filter = FilterExpr::Eq(FilterField::FileExtension, ".ts".to_string());
    let hits = store
        .search_dense(&[1.0, 0.0, 0.0], 10, Some(&filter))
        .await
        .unwrap();

    assert!(!hits.is_empty());
    assert!(hits.iter().all(|hit| hit.relative_path.ends_with(".ts")));
}

#[tokio::test]
async fn scenario_4_hybrid_rrf_ranks_dual_source_hit_above_single_source() {
    let storage = tempdir().unwrap();
    let db_path = storage.path().join("rrf-test.db");
    let store = SqliteVectorStore::open(&db_path).unwrap();
    store.ensure_collection(3, CollectionMode::Hybrid).await.unwrap();

    let mut near = chunk("near.rs", ".rs", 1, vec![1.0, 0.0, 0.0]);
    near.content = "fn unrelated_text() {}".to_string();
    let mut far = chunk("far.rs", ".rs", 1, vec![0.0, 1.0, 0.0]);
    far.content = "fn exact_lexical_match_token() {}".to_string();

    store.upsert(&[near, far]).await.unwrap();

    let hits = store
        .search_hybrid(&[1.0, 0.0, 0.0], "exact_lexical_match_token", 2, None)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
}
