//! Service-manual document model: page loading, fixed-window chunking, and
//! diagnostic trouble code recognition.

pub mod chunk;
pub mod document;
pub mod dtc;

pub use chunk::{ChunkConfig, ManualChunk, ManualChunker};
pub use document::{ManualError, ManualPage, load_manual};
pub use dtc::{extract_code, is_diagnostic_code};
