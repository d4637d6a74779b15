//! Error types for the retrieval engine

use autosync_embed::EmbedError;
use autosync_manual::ManualError;
use std::path::PathBuf;

/// Result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors surfaced by the hybrid retrieval engine.
///
/// An empty result is NOT an error: queries that match nothing return the
/// not-found sentinel string. Only infrastructure failures appear here.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The manual document is missing. Raised at build time and fatal to the
    /// engine; there is no automatic retry.
    #[error("manual not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The manual exists but could not be parsed or chunked.
    #[error("manual processing failed: {source}")]
    Manual {
        #[source]
        source: ManualError,
    },

    /// The embedding provider could not be initialized or invoked. Surfaces
    /// to the caller of `search`; there is no fallback embedding method.
    #[error("embedding provider unavailable: {source}")]
    EmbeddingUnavailable {
        #[source]
        source: EmbedError,
    },

    /// A persisted index exists but cannot be loaded or parsed. Propagated
    /// rather than rebuilding over possibly-intentional state; rebuilding is
    /// an explicit operational action.
    #[error("persisted index is corrupt: {message}")]
    IndexCorrupt { message: String },

    /// Storage-layer failures (SQLite access, serialization).
    #[error("index storage error: {source}")]
    Storage {
        #[source]
        source: anyhow::Error,
    },

    /// Filesystem plumbing errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl RetrievalError {
    /// Wrap an embedding failure.
    pub fn embedding(source: EmbedError) -> Self {
        Self::EmbeddingUnavailable { source }
    }

    /// Create an index-corruption error with a descriptive message.
    pub fn index_corrupt(message: impl std::fmt::Display) -> Self {
        Self::IndexCorrupt {
            message: message.to_string(),
        }
    }

    /// Wrap a storage-layer failure.
    pub fn storage(source: anyhow::Error) -> Self {
        Self::Storage { source }
    }
}

impl From<ManualError> for RetrievalError {
    fn from(err: ManualError) -> Self {
        match err {
            ManualError::SourceNotFound { path } => Self::SourceNotFound { path },
            other => Self::Manual { source: other },
        }
    }
}
