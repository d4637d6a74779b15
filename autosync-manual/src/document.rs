//! Loading a service manual into per-page raw text.
//!
//! The manual is the single source document the whole retrieval engine is
//! built from. PDF manuals are extracted page by page; plain-text manuals
//! are split on form-feed characters so fixture files can model page breaks.
//! Page order is preserved and page indices refer to positions in the
//! original document, even when blank pages are dropped.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for manual loading operations.
pub type Result<T> = std::result::Result<T, ManualError>;

/// Errors raised while locating or parsing the manual document.
#[derive(Debug, Error)]
pub enum ManualError {
    /// The manual does not exist at the configured path. Fatal to retrieval:
    /// the engine cannot operate without the source document.
    #[error("manual not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The document exists but its text could not be extracted.
    #[error("failed to extract text from {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// IO errors while reading the document
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Async task join errors
    #[error("async task failed: {source}")]
    AsyncTask {
        #[from]
        source: tokio::task::JoinError,
    },
}

/// One parsed page of the manual.
///
/// Immutable once loaded; the engine holds every page for its lifetime so
/// the exact-match strategy can scan raw text without re-parsing the
/// document per query.
#[derive(Debug, Clone, Serialize)]
pub struct ManualPage {
    /// Identifier of the document this page came from (display path).
    pub source: String,
    /// 0-based position of the page in the original document.
    pub page_index: usize,
    /// Raw extracted text of the page.
    pub text: String,
}

/// Load a manual into ordered pages.
///
/// `.pdf` files are extracted per page in a blocking task; anything else is
/// read as UTF-8 text and split on form feeds. Pages whose text is entirely
/// whitespace are dropped, so a document with no extractable text yields an
/// empty vector rather than an error.
pub async fn load_manual(path: &Path) -> Result<Vec<ManualPage>> {
    if !path.exists() {
        return Err(ManualError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let source = path.display().to_string();
    let raw_pages = match path.extension().and_then(|ext| ext.to_str()) {
        Some("pdf") => {
            let pdf_path = path.to_path_buf();
            tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_by_pages(&pdf_path).map_err(|e| {
                    ManualError::Extraction {
                        path: pdf_path.clone(),
                        message: e.to_string(),
                    }
                })
            })
            .await??
        }
        _ => {
            let text = tokio::fs::read_to_string(path).await?;
            split_text_pages(&text)
        }
    };

    let pages: Vec<ManualPage> = raw_pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(page_index, text)| ManualPage {
            source: source.clone(),
            page_index,
            text,
        })
        .collect();

    tracing::info!("Loaded {} pages from {}", pages.len(), source);
    Ok(pages)
}

/// Split plain text into pages on form-feed characters.
fn split_text_pages(text: &str) -> Vec<String> {
    text.split('\u{000C}').map(str::to_string).collect()
}
