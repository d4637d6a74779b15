//! Integration tests for the hybrid search pipeline.
//!
//! These run against a deterministic stub embedding provider (a hashed
//! bag-of-words projection) so they exercise the full build/search flow
//! without downloading any model: exact-match precedence, fallback
//! behavior, idempotent builds, and the concurrent first-call guarantee.

use anyhow::Result;
use async_trait::async_trait;
use autosync_embed::{EmbeddingProvider, EmbeddingResult};
use autosync_retriever::engine::{EXACT_MATCH_MARKER, SEMANTIC_MARKER};
use autosync_retriever::{EngineConfig, HybridEngine, NOT_FOUND_SENTINEL, RetrievalError};
use half::f16;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::time::Duration;

const DIM: usize = 32;

/// Deterministic embedding stub: tokens are hashed into a fixed-size
/// bag-of-words vector, so texts sharing words land close together.
#[derive(Debug, Default)]
struct StubEmbedder {
    batch_calls: AtomicUsize,
}

impl StubEmbedder {
    fn vector(text: &str) -> Vec<f16> {
        let mut values = [0.0f32; DIM];
        for token in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            values[(hasher.finish() % DIM as u64) as usize] += 1.0;
        }
        let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }
        values.iter().map(|&x| f16::from_f32(x)).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed_text(&self, text: &str) -> autosync_embed::Result<Vec<f16>> {
        Ok(Self::vector(text))
    }

    async fn embed_texts(&self, texts: &[String]) -> autosync_embed::Result<EmbeddingResult> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        // Keep the build window open long enough for racing callers to pile
        // up on the initialization guard.
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok(EmbeddingResult::new(
            texts.iter().map(|t| Self::vector(t)).collect(),
        ))
    }

    fn embedding_dimension(&self) -> usize {
        DIM
    }

    fn provider_name(&self) -> &str {
        "stub-hash"
    }
}

const MANUAL_TEXT: &str = "General maintenance overview.\nCheck the oil level weekly.\
\u{000C}Brake pads wear inspection.\nReplace worn brake pads promptly.\
\u{000C}P0217 \u{2013} Engine Coolant Over Temperature Condition.\nStop the vehicle immediately.\
\u{000C}Coolant reservoir inspection procedure.\nTop up the coolant reservoir when the level is low.";

fn write_manual(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("manual.txt");
    std::fs::write(&path, content).unwrap();
    path
}

fn engine_with_stub(manual: &Path, index_dir: &Path) -> (HybridEngine, Arc<StubEmbedder>) {
    let stub = Arc::new(StubEmbedder::default());
    let provider: Arc<dyn EmbeddingProvider> = stub.clone();
    let engine = HybridEngine::new(EngineConfig::new(manual, index_dir), provider);
    (engine, stub)
}

#[tokio::test]
async fn test_exact_match_takes_precedence_over_semantic() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), MANUAL_TEXT);
    let (engine, _stub) = engine_with_stub(&manual, &dir.path().join("index"));

    let answer = engine.search("What is P0217?").await?;

    assert!(answer.starts_with(EXACT_MATCH_MARKER), "got: {answer}");
    assert!(answer.contains("P0217 \u{2013} Engine Coolant Over Temperature Condition."));
    assert!(!answer.contains(SEMANTIC_MARKER));
    Ok(())
}

#[tokio::test]
async fn test_first_page_wins_when_code_repeats() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(
        dir.path(),
        "Front matter.\
        \u{000C}Nothing relevant here.\
        \u{000C}P0300 - Random Multiple Cylinder Misfire Detected.\
        \u{000C}Padding page.\
        \u{000C}Appendix note.\
        \u{000C}P0300 - see the troubleshooting chapter instead.",
    );
    let (engine, _stub) = engine_with_stub(&manual, &dir.path().join("index"));

    let answer = engine.search("p0300").await?;
    assert!(answer.contains("Random Multiple Cylinder Misfire Detected"));
    assert!(!answer.contains("troubleshooting chapter"));
    Ok(())
}

#[tokio::test]
async fn test_codeless_query_falls_back_with_page_attribution() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), MANUAL_TEXT);
    let (engine, _stub) = engine_with_stub(&manual, &dir.path().join("index"));

    let answer = engine
        .search("coolant reservoir inspection procedure")
        .await?;

    assert!(answer.starts_with(SEMANTIC_MARKER), "got: {answer}");
    assert!(answer.contains("Coolant reservoir inspection procedure."));
    assert!(answer.contains("(Source: manual page 4)"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_code_falls_back_to_semantic() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), MANUAL_TEXT);
    let (engine, _stub) = engine_with_stub(&manual, &dir.path().join("index"));

    // P9999 is a well-formed code that appears nowhere in the manual.
    let answer = engine.search("P9999 brake pads inspection").await?;
    assert!(answer.starts_with(SEMANTIC_MARKER), "got: {answer}");
    Ok(())
}

#[tokio::test]
async fn test_second_build_loads_instead_of_reembedding() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), MANUAL_TEXT);
    let index_dir = dir.path().join("index");
    let query = "coolant reservoir inspection procedure";

    let (first_engine, first_stub) = engine_with_stub(&manual, &index_dir);
    let first_answer = first_engine.search(query).await?;
    assert_eq!(
        first_stub.batch_calls.load(Ordering::SeqCst),
        1,
        "cold build embeds exactly once"
    );

    // A fresh engine over the same index directory must warm-load.
    let (second_engine, second_stub) = engine_with_stub(&manual, &index_dir);
    let second_answer = second_engine.search(query).await?;
    assert_eq!(
        second_stub.batch_calls.load(Ordering::SeqCst),
        0,
        "warm start must not recompute chunk embeddings"
    );
    assert_eq!(first_answer, second_answer);
    Ok(())
}

#[tokio::test]
async fn test_empty_manual_returns_sentinel() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), "  \n \u{000C}\t\u{000C}  ");
    let (engine, _stub) = engine_with_stub(&manual, &dir.path().join("index"));

    assert_eq!(engine.search("What is P0217?").await?, NOT_FOUND_SENTINEL);
    assert_eq!(
        engine.search("how do I change the oil").await?,
        NOT_FOUND_SENTINEL
    );
    Ok(())
}

#[tokio::test]
async fn test_concurrent_first_calls_build_once() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), MANUAL_TEXT);
    let (engine, stub) = engine_with_stub(&manual, &dir.path().join("index"));
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(
            async move { engine.search("What is P0217?").await },
        ));
    }

    let mut answers = Vec::new();
    for handle in handles {
        answers.push(handle.await??);
    }

    assert_eq!(
        stub.batch_calls.load(Ordering::SeqCst),
        1,
        "racing first callers must share a single build"
    );
    for answer in &answers {
        assert_eq!(answer, &answers[0]);
        assert!(answer.starts_with(EXACT_MATCH_MARKER));
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_manual_is_fatal() -> Result<()> {
    let dir = TempDir::new()?;
    let (engine, _stub) = engine_with_stub(
        &dir.path().join("no-such-manual.pdf"),
        &dir.path().join("index"),
    );

    let err = engine.search("What is P0217?").await.unwrap_err();
    assert!(matches!(err, RetrievalError::SourceNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_index_is_reported_not_rebuilt() -> Result<()> {
    let dir = TempDir::new()?;
    let manual = write_manual(dir.path(), MANUAL_TEXT);
    let index_dir = dir.path().join("index");
    std::fs::create_dir_all(&index_dir)?;
    std::fs::write(index_dir.join("autosync-index.db"), b"this is not a database")?;

    let (engine, stub) = engine_with_stub(&manual, &index_dir);
    let err = engine.search("What is P0217?").await.unwrap_err();

    assert!(matches!(err, RetrievalError::IndexCorrupt { .. }), "got: {err}");
    assert_eq!(
        stub.batch_calls.load(Ordering::SeqCst),
        0,
        "a corrupt index must never be silently rebuilt"
    );
    Ok(())
}
