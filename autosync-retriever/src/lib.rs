//! autosync-retriever: hybrid retrieval over a vehicle service manual
//!
//! This crate resolves free-text diagnostic queries against a service manual
//! using two strategies composed in a pipeline:
//!
//! 1. **Exact code match**: a diagnostic trouble code in the query (for
//!    example `P0217`) is looked up verbatim in the raw page text, returning
//!    the precise manual line. Embeddings of near-identical alphanumeric
//!    codes are poorly separated, so codes never go through semantic search.
//! 2. **Semantic fallback**: when no code is present (or the code appears
//!    nowhere in the manual), the query is embedded and matched against a
//!    persisted index of overlapping manual chunks.
//!
//! ```text
//! Manual → Pages → Chunker → Embeddings → SQLite index
//!             ↓                               ↓
//!        exact code scan  ←  HybridEngine  →  nearest-neighbor search
//! ```
//!
//! The index is built once per deployment (cold build) and loaded on later
//! runs (warm start); see [`engine::HybridEngine`].

pub mod engine;
pub mod error;
pub mod index;

pub use engine::{EngineConfig, EngineStats, HybridEngine, NOT_FOUND_SENTINEL};
pub use error::{Result, RetrievalError};
pub use index::ManualIndex;
