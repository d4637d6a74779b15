//! Configuration for embedding models

use serde::Serialize;

/// Default embedding model. The same MiniLM sentence transformer must be
/// used at index-build time and query time; mixing models silently degrades
/// similarity quality.
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Configuration for an embedding provider.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    pub model_name: String,
    /// Maximum batch size for embedding generation
    pub batch_size: usize,
    /// Whether to normalize embeddings to unit length
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            batch_size: 32,
            normalize: true,
        }
    }
}

impl EmbedConfig {
    /// Create a configuration for a named model with default settings.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }
}
