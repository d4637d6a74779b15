use autosync_embed::{EmbedConfig, FastEmbedProvider};
use autosync_manual::ChunkConfig;
use autosync_retriever::{EngineConfig, HybridEngine};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// A CLI tool to build and query the service-manual retrieval index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the service manual (PDF or plain text)
    #[arg(short, long)]
    manual: PathBuf,

    /// Directory holding the persisted index database
    #[arg(short, long, default_value = "index")]
    index_dir: PathBuf,

    /// Embedding model name
    #[arg(long, default_value = "all-MiniLM-L6-v2")]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the index (or load it when already persisted)
    Build {
        /// Chunk window size in characters
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,
        /// Overlap between consecutive chunks in characters
        #[arg(long, default_value_t = 200)]
        overlap: usize,
    },
    /// Resolve a query against the manual
    Search {
        /// Free-text query, e.g. "What is P0217?"
        query: String,
        /// Number of nearest neighbors considered by the semantic fallback
        #[arg(short, long, default_value_t = 4)]
        top_k: usize,
    },
    /// Show page and chunk counts
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let provider = FastEmbedProvider::create(EmbedConfig::new(args.model.clone())).await?;
    let provider = Arc::new(provider);

    match args.command {
        Commands::Build {
            chunk_size,
            overlap,
        } => {
            let config = EngineConfig::new(&args.manual, &args.index_dir).with_chunk_config(
                ChunkConfig::default()
                    .with_chunk_size(chunk_size)
                    .with_overlap(overlap),
            );
            let engine = HybridEngine::new(config, provider);
            engine.build_or_load().await?;
            let stats = engine.stats().await?;
            println!(
                "Index ready: {} pages, {} chunks ({})",
                stats.pages,
                stats.chunks,
                args.index_dir.display()
            );
        }
        Commands::Search { query, top_k } => {
            let config = EngineConfig::new(&args.manual, &args.index_dir).with_top_k(top_k);
            let engine = HybridEngine::new(config, provider);
            println!("{}", engine.search(&query).await?);
        }
        Commands::Stats => {
            let config = EngineConfig::new(&args.manual, &args.index_dir);
            let engine = HybridEngine::new(config, provider);
            let stats = engine.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
