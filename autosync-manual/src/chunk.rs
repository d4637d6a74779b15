//! Fixed-window chunking of manual pages.
//!
//! Pages are split into overlapping windows of characters. The overlap means
//! a diagnostic-code line cut at a window boundary still appears whole in at
//! least one neighboring chunk; boundaries inside a sentence are acceptable,
//! the overlap only provides best-effort continuity. Windows operate on
//! `char` boundaries so multi-byte UTF-8 never splits mid-codepoint.

use crate::document::ManualPage;
use serde::Serialize;

/// Configuration for chunking manual pages.
///
/// The defaults (1000-character windows with a 200-character overlap) are
/// tuning parameters suited to a manual on the order of tens of pages, not
/// hard requirements.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target window size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    /// Distance between window starts. Always at least one character, so a
    /// misconfigured overlap can never stall the chunker.
    fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap).max(1)
    }
}

/// A contiguous slice of one page's text, the unit of semantic retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct ManualChunk {
    /// Page this chunk was cut from (original document index).
    pub page_index: usize,
    /// Character offset of the chunk within its page.
    pub offset: usize,
    /// Position of the chunk in the whole manual (0-indexed).
    pub sequence: usize,
    /// The chunk text.
    pub text: String,
}

/// Splits pages into overlapping fixed-size windows.
pub struct ManualChunker {
    config: ChunkConfig,
}

impl ManualChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Chunk every page in order, numbering chunks sequentially across the
    /// whole manual.
    pub fn chunk_pages(&self, pages: &[ManualPage]) -> Vec<ManualChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            self.chunk_page(page, &mut chunks);
        }
        tracing::debug!(
            "Chunked {} pages into {} chunks (window {}, overlap {})",
            pages.len(),
            chunks.len(),
            self.config.chunk_size,
            self.config.overlap
        );
        chunks
    }

    fn chunk_page(&self, page: &ManualPage, out: &mut Vec<ManualChunk>) {
        let chars: Vec<char> = page.text.chars().collect();
        if chars.is_empty() {
            return;
        }

        let step = self.config.step();
        let mut start = 0;
        loop {
            let end = (start + self.config.chunk_size).min(chars.len());
            out.push(ManualChunk {
                page_index: page.page_index,
                offset: start,
                sequence: out.len(),
                text: chars[start..end].iter().collect(),
            });
            if end == chars.len() {
                break;
            }
            start += step;
        }
    }
}
