//! # autosync-embed
//!
//! Text embedding generation for the diagnostics assistant, backed by local
//! ONNX models via FastEmbed. The manual index and every query embedding
//! must come from the same model, so this crate centralizes model selection
//! and caches loaded models process-wide.
//!
//! ## Quick Start
//!
//! ```no_run
//! use autosync_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::create(EmbedConfig::default()).await?;
//! let vector = provider.embed_text("engine coolant over temperature").await?;
//! println!("dimension: {}", vector.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Memory Usage
//!
//! Embeddings are stored as half-precision (f16) vectors; loaded models are
//! cached globally so multiple providers with the same configuration share
//! one model instance.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider};
