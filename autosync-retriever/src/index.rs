//! Persistent semantic index over manual chunks.
//!
//! This module is the storage layer for the retrieval engine: an SQLite
//! database holding every manual chunk together with its f16 embedding
//! vector, plus a single metadata row describing how the index was built.
//!
//! ## Database Schema
//!
//! ```sql
//! -- Chunks table: one row per manual chunk, embedding stored as f16 blob
//! CREATE TABLE chunks (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     page_index INTEGER,              -- page the chunk was cut from
//!     char_offset INTEGER,             -- character offset within the page
//!     sequence INTEGER,                -- position in the whole manual
//!     content TEXT,                    -- chunk text
//!     embedding BLOB                   -- f16 embedding vector
//! );
//!
//! -- Metadata table: single row recording the build parameters
//! CREATE TABLE index_meta (
//!     id INTEGER PRIMARY KEY CHECK (id = 1),
//!     model_name TEXT,
//!     dimension INTEGER,
//!     chunk_size INTEGER,
//!     overlap INTEGER,
//!     built_at TIMESTAMP
//! );
//! ```
//!
//! The index is written once per cold build, inside a single transaction,
//! and read-only thereafter. Query vectors must come from the model recorded
//! in `index_meta` for similarity scores to be meaningful.

use anyhow::Result;
use autosync_manual::ManualChunk;
use half::f16;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// A chunk row loaded back from the index.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: i64,
    pub page_index: usize,
    pub char_offset: usize,
    pub sequence: usize,
    pub content: String,
    pub embedding: Option<Vec<f16>>,
}

/// Build parameters recorded alongside the chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    pub model_name: String,
    pub dimension: usize,
    pub chunk_size: usize,
    pub overlap: usize,
}

/// SQLite-backed chunk and embedding store.
#[derive(Clone, Debug)]
pub struct ManualIndex {
    pool: SqlitePool,
}

impl ManualIndex {
    /// File name of the index database inside the index directory.
    pub const DB_FILE: &'static str = "autosync-index.db";

    /// Opens the index with persistent SQLite storage, creating the database
    /// file and tables when missing.
    pub async fn open(index_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(index_dir).await?;
        let db_path = index_dir.join(Self::DB_FILE);

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .create_if_missing(true)
                .page_size(1 << 16),
        )
        .await?;
        Self::new_with_pool(pool).await
    }

    /// Opens an in-memory index for testing.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Self::new_with_pool(pool).await
    }

    async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_index INTEGER NOT NULL,
                char_offset INTEGER NOT NULL,
                sequence INTEGER NOT NULL UNIQUE,
                content TEXT NOT NULL,
                embedding BLOB,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                model_name TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                chunk_size INTEGER NOT NULL,
                overlap INTEGER NOT NULL,
                built_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_page ON chunks(page_index)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Number of chunk rows in the index. Zero means a cold build is needed.
    pub async fn chunk_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Persist a complete cold build: all chunks with their embeddings plus
    /// the metadata row, in one transaction so a partial index is never
    /// observable.
    pub async fn store_build(
        &self,
        chunks: &[ManualChunk],
        embeddings: &[Vec<f16>],
        meta: &IndexMeta,
    ) -> Result<()> {
        anyhow::ensure!(
            chunks.len() == embeddings.len(),
            "chunk/embedding count mismatch: {} chunks, {} embeddings",
            chunks.len(),
            embeddings.len()
        );

        let mut tx = self.pool.begin().await?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let embedding_bytes = bytemuck::cast_slice::<f16, u8>(embedding);
            sqlx::query(
                r#"
                INSERT INTO chunks (page_index, char_offset, sequence, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(chunk.page_index as i64)
            .bind(chunk.offset as i64)
            .bind(chunk.sequence as i64)
            .bind(&chunk.text)
            .bind(embedding_bytes)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO index_meta (id, model_name, dimension, chunk_size, overlap)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                model_name = excluded.model_name,
                dimension = excluded.dimension,
                chunk_size = excluded.chunk_size,
                overlap = excluded.overlap
            "#,
        )
        .bind(&meta.model_name)
        .bind(meta.dimension as i64)
        .bind(meta.chunk_size as i64)
        .bind(meta.overlap as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Persisted {} chunks to the index", chunks.len());
        Ok(())
    }

    /// Read the build metadata, if any.
    pub async fn read_meta(&self) -> Result<Option<IndexMeta>> {
        let row = sqlx::query("SELECT model_name, dimension, chunk_size, overlap FROM index_meta WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| IndexMeta {
            model_name: row.get("model_name"),
            dimension: row.get::<i64, _>("dimension") as usize,
            chunk_size: row.get::<i64, _>("chunk_size") as usize,
            overlap: row.get::<i64, _>("overlap") as usize,
        }))
    }

    /// Nearest-neighbor search by cosine similarity, best first.
    ///
    /// The corpus is a single manual, so a brute-force scan over all stored
    /// vectors is fast enough; no approximate-NN structure is needed.
    pub async fn search_similar(
        &self,
        query_embedding: &[f16],
        limit: usize,
    ) -> Result<Vec<(StoredChunk, f32)>> {
        let rows = sqlx::query(
            "SELECT id, page_index, char_offset, sequence, content, embedding
             FROM chunks WHERE embedding IS NOT NULL ORDER BY sequence",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<(StoredChunk, f32)> = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            let chunk_embedding: Vec<f16> = bytemuck::pod_collect_to_vec(&embedding_bytes);
            let similarity = cosine_similarity(query_embedding, &chunk_embedding);

            scored.push((
                StoredChunk {
                    id: row.get("id"),
                    page_index: row.get::<i64, _>("page_index") as usize,
                    char_offset: row.get::<i64, _>("char_offset") as usize,
                    sequence: row.get::<i64, _>("sequence") as usize,
                    content: row.get("content"),
                    embedding: Some(chunk_embedding),
                },
                similarity,
            ));
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

/// Cosine similarity between two f16 vectors. Mismatched lengths and zero
/// norms score 0.0 instead of erroring, since they only occur when index and
/// query models disagree.
fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
