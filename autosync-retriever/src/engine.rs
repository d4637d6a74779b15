//! Hybrid query engine: exact code match first, semantic fallback second.
//!
//! The engine owns two artifacts produced from the manual: the ordered raw
//! pages (scanned verbatim by the exact-match strategy) and the persisted
//! semantic index (queried by the fallback strategy). Both are built lazily
//! on the first `search` call and shared read-only afterwards.
//!
//! ## Initialization
//!
//! Building the index is the only mutation path and is guarded by a
//! [`tokio::sync::OnceCell`]: racing first callers serialize on the cell, at
//! most one build runs, and everyone blocked on it observes either the
//! completed state or the build error. A failed build leaves the cell empty
//! so a later call can succeed once the environment is fixed; the engine
//! itself never retries.
//!
//! Cold build vs warm start: when the index database already exists and
//! holds at least one chunk, it is loaded as-is instead of re-running the
//! embedding computation. Embeddings are deterministic for a fixed model, so
//! this is purely a startup-cost optimization.

use crate::error::{Result, RetrievalError};
use crate::index::{IndexMeta, ManualIndex, StoredChunk};
use autosync_embed::EmbeddingProvider;
use autosync_manual::{ChunkConfig, ManualChunker, ManualPage, extract_code, load_manual};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Returned when neither strategy finds anything. A normal outcome, not an
/// error.
pub const NOT_FOUND_SENTINEL: &str = "No relevant information found.";

/// Prefix marking a verbatim manual line found by the exact-match strategy.
pub const EXACT_MATCH_MARKER: &str = "MANUAL MATCH:";

/// Prefix marking a semantic-search result.
pub const SEMANTIC_MARKER: &str = "MANUAL ANALYSIS:";

/// Configuration for the hybrid engine.
///
/// The retrieval tuning values (chunk window, overlap, top-k, preview
/// length) are adjustable; the defaults suit a manual on the order of tens
/// of pages.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the service manual document.
    pub manual_path: PathBuf,
    /// Directory holding the persisted index database.
    pub index_dir: PathBuf,
    /// Chunking parameters used for cold builds.
    pub chunk_config: ChunkConfig,
    /// Number of nearest neighbors fetched by the semantic fallback.
    pub top_k: usize,
    /// Maximum characters of chunk text shown in a fallback answer.
    pub preview_length: usize,
}

impl EngineConfig {
    pub fn new(manual_path: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            manual_path: manual_path.into(),
            index_dir: index_dir.into(),
            chunk_config: ChunkConfig::default(),
            top_k: 4,
            preview_length: 200,
        }
    }

    pub fn with_chunk_config(mut self, chunk_config: ChunkConfig) -> Self {
        self.chunk_config = chunk_config;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }
}

/// Engine counters exposed to the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub pages: usize,
    pub chunks: u64,
}

/// Immutable state shared by every query after initialization.
struct EngineState {
    pages: Vec<ManualPage>,
    index: ManualIndex,
}

/// Hybrid retrieval engine over one service manual.
pub struct HybridEngine {
    config: EngineConfig,
    provider: Arc<dyn EmbeddingProvider>,
    state: OnceCell<Arc<EngineState>>,
}

impl HybridEngine {
    /// Create an engine. Nothing is loaded until the first call to
    /// [`search`](Self::search) or [`build_or_load`](Self::build_or_load).
    pub fn new(config: EngineConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            provider,
            state: OnceCell::new(),
        }
    }

    /// Force initialization: parse the manual and build or load the index.
    /// Idempotent; concurrent callers share a single build.
    pub async fn build_or_load(&self) -> Result<()> {
        self.state().await.map(|_| ())
    }

    /// Page and chunk counts of the initialized engine.
    pub async fn stats(&self) -> Result<EngineStats> {
        let state = self.state().await?;
        let chunks = state
            .index
            .chunk_count()
            .await
            .map_err(RetrievalError::storage)?;
        Ok(EngineStats {
            pages: state.pages.len(),
            chunks,
        })
    }

    /// Resolve a free-text query to the most precise available answer.
    ///
    /// Strategy 1 (always tried first): if the query carries a diagnostic
    /// trouble code that occurs verbatim in the manual, return the exact
    /// manual line. Strategy 2: embed the query and return the closest
    /// indexed chunk, annotated with its page. When both strategies come up
    /// empty the sentinel string is returned; only infrastructure failures
    /// produce errors.
    pub async fn search(&self, query: &str) -> Result<String> {
        let state = self.state().await?;
        debug!("Searching manual for: {query}");

        if let Some(code) = extract_code(query) {
            debug!("Exact code detected: {code}");
            if let Some(line) = exact_code_match(&state.pages, &code) {
                return Ok(format!("{EXACT_MATCH_MARKER}\n{line}"));
            }
            debug!("Code {code} not present in any page, falling back");
        }

        self.semantic_fallback(&state, query).await
    }

    async fn state(&self) -> Result<Arc<EngineState>> {
        self.state
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    async fn initialize(&self) -> Result<Arc<EngineState>> {
        info!("Initializing hybrid retrieval engine");

        let pages = load_manual(&self.config.manual_path).await?;

        let db_path = self.config.index_dir.join(ManualIndex::DB_FILE);
        let had_db = db_path.exists();

        // An unreadable pre-existing database is corruption, not an invite
        // to rebuild over it.
        let as_open_error = |e: anyhow::Error| {
            if had_db {
                RetrievalError::index_corrupt(e)
            } else {
                RetrievalError::storage(e)
            }
        };
        let index = ManualIndex::open(&self.config.index_dir)
            .await
            .map_err(as_open_error)?;
        let existing_chunks = index.chunk_count().await.map_err(as_open_error)?;

        if had_db && existing_chunks > 0 {
            self.warm_load(&index, existing_chunks).await?;
        } else {
            self.cold_build(&index, &pages).await?;
        }

        Ok(Arc::new(EngineState { pages, index }))
    }

    async fn warm_load(&self, index: &ManualIndex, chunks: u64) -> Result<()> {
        let meta = index
            .read_meta()
            .await
            .map_err(RetrievalError::index_corrupt)?
            .ok_or_else(|| {
                RetrievalError::index_corrupt("index is populated but has no metadata record")
            })?;

        if meta.dimension != self.provider.embedding_dimension() {
            // A model mismatch degrades similarity quality silently; it is
            // not a load failure.
            warn!(
                "Index was built with {} ({}d) but the provider reports {}d",
                meta.model_name,
                meta.dimension,
                self.provider.embedding_dimension()
            );
        }

        info!("Loaded persisted index: {chunks} chunks ({})", meta.model_name);
        Ok(())
    }

    async fn cold_build(&self, index: &ManualIndex, pages: &[ManualPage]) -> Result<()> {
        let chunker = ManualChunker::new(self.config.chunk_config.clone());
        let chunks = chunker.chunk_pages(pages);

        if chunks.is_empty() {
            info!("Manual has no extractable text; index left empty");
            return Ok(());
        }

        info!("Cold build: embedding {} chunks", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let result = self
            .provider
            .embed_texts(&texts)
            .await
            .map_err(RetrievalError::embedding)?;

        let meta = IndexMeta {
            model_name: self.provider.provider_name().to_string(),
            dimension: result.dimension,
            chunk_size: self.config.chunk_config.chunk_size,
            overlap: self.config.chunk_config.overlap,
        };
        index
            .store_build(&chunks, &result.embeddings, &meta)
            .await
            .map_err(RetrievalError::storage)?;

        info!("Index built: {} chunks persisted", chunks.len());
        Ok(())
    }

    async fn semantic_fallback(&self, state: &EngineState, query: &str) -> Result<String> {
        let query_embedding = self
            .provider
            .embed_text(query)
            .await
            .map_err(RetrievalError::embedding)?;

        let neighbors = state
            .index
            .search_similar(&query_embedding, self.config.top_k)
            .await
            .map_err(RetrievalError::storage)?;

        let Some((best, similarity)) = neighbors.into_iter().next() else {
            return Ok(NOT_FOUND_SENTINEL.to_string());
        };
        debug!(
            "Semantic fallback selected chunk {} (page {}, similarity {similarity:.3})",
            best.sequence, best.page_index
        );

        Ok(self.render_semantic_answer(&best))
    }

    fn render_semantic_answer(&self, chunk: &StoredChunk) -> String {
        let preview: String = chunk.content.chars().take(self.config.preview_length).collect();
        let ellipsis = if chunk.content.chars().count() > self.config.preview_length {
            "..."
        } else {
            ""
        };
        format!(
            "{SEMANTIC_MARKER}\n{preview}{ellipsis}\n(Source: manual page {})",
            chunk.page_index + 1
        )
    }
}

/// Scan raw pages for a verbatim code occurrence.
///
/// Pages are visited in page order and the first line of the first page
/// containing the code wins, so the answer is deterministic no matter how
/// many pages mention the code.
fn exact_code_match(pages: &[ManualPage], code: &str) -> Option<String> {
    for page in pages {
        if page.text.contains(code) {
            for line in page.text.lines() {
                if line.contains(code) {
                    return Some(line.trim().to_string());
                }
            }
        }
    }
    None
}
