//! SQLite + `sqlite-vec` backed vector store, one file per codebase.
//!
//! Dense search uses the `vec0` virtual table's brute-force KNN (`MATCH`).
//! Hybrid mode additionally maintains an FTS5 table and fuses the two
//! candidate lists with Reciprocal Rank Fusion (see [`super::rrf`]).

use super::filter::{self, CompiledFilter};
use super::rrf::{self, RankedCandidate};
use crate::domain::error::{Error, Result};
use crate::domain::ports::VectorStoreProvider;
use crate::domain::types::{Chunk, CollectionMode, FilterExpr, Language, SearchHit, SplitterKind};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::spawn_blocking;
use zerocopy::AsBytes;

/// One SQLite database file backing one codebase's vector collection.
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
    rrf_k: AtomicU32,
}

impl SqliteVectorStore {
    /// Open (creating if absent) the store file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        register_extension();

        let conn = Connection::open(&path)
            .map_err(|e| Error::store(format!("failed to open {}: {e}", path.display())))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -4000;",
        )
        .map_err(|e| Error::store(format!("pragma setup failed: {e}")))?;

        init_meta_table(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
            rrf_k: AtomicU32::new(rrf::DEFAULT_K.to_bits()),
        })
    }

    /// Path to the backing file, for diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Override the RRF constant used by [`VectorStoreProvider::search_hybrid`].
    /// Takes effect on the next hybrid search.
    pub fn set_rrf_k(&self, k: f32) {
        self.rrf_k.store(k.to_bits(), Ordering::Relaxed);
    }

    fn rrf_k(&self) -> f32 {
        f32::from_bits(self.rrf_k.load(Ordering::Relaxed))
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::store("connection mutex poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::store(format!("blocking task failed: {e}")))?
    }
}

fn register_extension() {
    use std::sync::Once;
    static REGISTER: Once = Once::new();
    // SAFETY: `sqlite3_vec_init` has the signature SQLite's auto-extension
    // mechanism expects; this transmute is the pattern documented by the
    // sqlite-vec crate itself.
    REGISTER.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

fn init_meta_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS collection_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn meta_get(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM collection_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    })
}

fn meta_set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO collection_meta(key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn mode_str(mode: CollectionMode) -> &'static str {
    match mode {
        CollectionMode::Dense => "dense",
        CollectionMode::Hybrid => "hybrid",
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn ensure_collection(&self, dimension: usize, mode: CollectionMode) -> Result<()> {
        self.with_conn(move |conn| {
            if let Some(stored) = meta_get(conn, "dimension")? {
                let stored: usize = stored
                    .parse()
                    .map_err(|_| Error::store("corrupt dimension metadata"))?;
                if stored != dimension {
                    return Err(Error::config(format!(
                        "collection dimension {stored} does not match requested {dimension}"
                    )));
                }
            } else {
                meta_set(conn, "dimension", &dimension.to_string())?;
                meta_set(conn, "mode", mode_str(mode))?;
            }

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS chunks (
                    id TEXT PRIMARY KEY,
                    relative_path TEXT NOT NULL,
                    start_line INTEGER NOT NULL,
                    end_line INTEGER NOT NULL,
                    file_extension TEXT NOT NULL,
                    content TEXT NOT NULL,
                    language TEXT NOT NULL,
                    splitter TEXT NOT NULL,
                    symbol TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_chunks_path ON chunks(relative_path);",
            )?;

            let vec_sql = format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec USING vec0(
                    chunk_id TEXT PRIMARY KEY,
                    embedding float[{dimension}] distance_metric=cosine
                )"
            );
            conn.execute_batch(&vec_sql)?;

            if mode == CollectionMode::Hybrid {
                conn.execute_batch(
                    "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
                        chunk_id UNINDEXED,
                        content
                    );",
                )?;
            }

            Ok(())
        })
        .await
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let chunks = chunks.to_vec();
        self.with_conn(move |conn| {
            let hybrid = meta_get(conn, "mode")?.as_deref() == Some("hybrid");
            let tx = conn.unchecked_transaction()?;

            {
                let mut insert_chunk = tx.prepare_cached(
                    "INSERT OR REPLACE INTO chunks
                     (id, relative_path, start_line, end_line, file_extension, content, language, splitter, symbol)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?;
                let mut insert_vec = tx.prepare_cached(
                    "INSERT OR REPLACE INTO chunks_vec(chunk_id, embedding) VALUES (?1, ?2)",
                )?;
                let mut delete_fts = if hybrid {
                    Some(tx.prepare_cached("DELETE FROM chunks_fts WHERE chunk_id = ?1")?)
                } else {
                    None
                };
                let mut insert_fts = if hybrid {
                    Some(tx.prepare_cached(
                        "INSERT INTO chunks_fts(chunk_id, content) VALUES (?1, ?2)",
                    )?)
                } else {
                    None
                };

                for chunk in &chunks {
                    let vector = chunk
                        .vector
                        .as_ref()
                        .ok_or_else(|| Error::store(format!("chunk {} has no vector", chunk.id)))?;

                    insert_chunk.execute(params![
                        chunk.id,
                        chunk.relative_path,
                        chunk.start_line,
                        chunk.end_line,
                        chunk.file_extension,
                        chunk.content,
                        chunk.metadata.language.as_str(),
                        splitter_str(chunk.metadata.splitter),
                        chunk.metadata.symbol,
                    ])?;

                    insert_vec.execute(params![chunk.id, vector.as_bytes()])?;

                    if let Some(stmt) = delete_fts.as_mut() {
                        stmt.execute(params![chunk.id])?;
                    }
                    if let Some(stmt) = insert_fts.as_mut() {
                        stmt.execute(params![chunk.id, chunk.content])?;
                    }
                }
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete_paths(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let paths = paths.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction()?;
            for path in &paths {
                let ids: Vec<String> = {
                    let mut stmt =
                        tx.prepare_cached("SELECT id FROM chunks WHERE relative_path = ?1")?;
                    let rows = stmt.query_map(params![path], |row| row.get::<_, String>(0))?;
                    rows.collect::<std::result::Result<_, _>>()?
                };
                for id in ids {
                    tx.execute("DELETE FROM chunks_vec WHERE chunk_id = ?1", params![id])?;
                    tx.execute("DELETE FROM chunks_fts WHERE chunk_id = ?1", params![id])
                        .ok();
                }
                tx.execute("DELETE FROM chunks WHERE relative_path = ?1", params![path])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "DELETE FROM chunks;
                 DELETE FROM chunks_vec;
                 DELETE FROM chunks_fts;",
            )
            .or_else(|_| conn.execute_batch("DELETE FROM chunks; DELETE FROM chunks_vec;"))?;
            Ok(())
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    async fn search_dense(
        &self,
        query_vector: &[f32],
        top_k: usize,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = query_vector.to_vec();
        let compiled = filter.map(filter::compile);
        self.with_conn(move |conn| {
            let candidates = search_dense_sync(conn, &query_vector, top_k, compiled.as_ref())?;
            Ok(candidates.into_iter().map(|c| c.hit).collect())
        })
        .await
    }

    async fn search_hybrid(
        &self,
        query_vector: &[f32],
        query_text: &str,
        top_k: usize,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<SearchHit>> {
        let query_vector = query_vector.to_vec();
        let query_text = query_text.to_string();
        let compiled = filter.map(filter::compile);
        let k = self.rrf_k();
        self.with_conn(move |conn| {
            let fetch = top_k.max(50);
            let dense = search_dense_sync(conn, &query_vector, fetch, compiled.as_ref())?;
            let lexical = match search_fts_sync(conn, &query_text, fetch) {
                Ok(hits) => hits,
                Err(_) => {
                    tracing::warn!("FTS5 lookup failed, falling back to dense-only results");
                    Vec::new()
                }
            };
            Ok(rrf::fuse(&dense, &lexical, k, top_k))
        })
        .await
    }
}

fn splitter_str(kind: SplitterKind) -> &'static str {
    match kind {
        SplitterKind::Structural => "structural",
        SplitterKind::Fallback => "fallback",
    }
}

fn search_dense_sync(
    conn: &Connection,
    query_vector: &[f32],
    top_k: usize,
    filter: Option<&CompiledFilter>,
) -> Result<Vec<RankedCandidate>> {
    let any_vectors: i64 = conn.query_row("SELECT COUNT(*) FROM chunks_vec", [], |r| r.get(0))?;
    if any_vectors == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT c.id, c.content, c.relative_path, c.start_line, c.end_line, c.language, v.distance
         FROM chunks_vec v
         JOIN chunks c ON c.id = v.chunk_id
         WHERE v.embedding MATCH ?1 AND k = ?2",
    );
    let mut bound: Vec<rusqlite::types::Value> = vec![
        rusqlite::types::Value::Blob(query_vector.as_bytes().to_vec()),
        rusqlite::types::Value::Integer(top_k as i64),
    ];
    if let Some(filter) = filter {
        sql.push_str(" AND ");
        sql.push_str(&filter.sql);
        bound.extend(filter.params.iter().cloned());
    }
    sql.push_str(" ORDER BY v.distance ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bound.iter()), |row| {
        let id: String = row.get(0)?;
        let distance: f32 = row.get(6)?;
        Ok(RankedCandidate {
            id,
            distance,
            hit: SearchHit {
                content: row.get(1)?,
                relative_path: row.get(2)?,
                start_line: row.get(3)?,
                end_line: row.get(4)?,
                language: Language::from_name(&row.get::<_, String>(5)?),
                score: (1.0 - distance).clamp(0.0, 1.0),
            },
        })
    })?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn search_fts_sync(conn: &Connection, query_text: &str, top_k: usize) -> Result<Vec<RankedCandidate>> {
    let table_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='chunks_fts'",
        [],
        |r| r.get(0),
    )?;
    if table_exists == 0 || query_text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let sql = "SELECT c.id, c.content, c.relative_path, c.start_line, c.end_line, c.language, bm25(chunks_fts) AS rank
               FROM chunks_fts
               JOIN chunks c ON c.id = chunks_fts.chunk_id
               WHERE chunks_fts MATCH ?1
               ORDER BY rank
               LIMIT ?2";
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![query_text, top_k as i64], |row| {
        let id: String = row.get(0)?;
        Ok(RankedCandidate {
            id,
            distance: f32::INFINITY,
            hit: SearchHit {
                content: row.get(1)?,
                relative_path: row.get(2)?,
                start_line: row.get(3)?,
                end_line: row.get(4)?,
                language: Language::from_name(&row.get::<_, String>(5)?),
                score: 0.0,
            },
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}
