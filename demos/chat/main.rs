//! # RAG Chat Example
//!
//! Loads the documents named in an agent configuration file, indexes them,
//! then answers questions typed on stdin with citations and reference
//! previews.
//!
//! Runs offline by default. Build with `--features openai` and set
//! `OPENAI_API_KEY` to use OpenAI embeddings and chat completions.
//!
//! Run: `cargo run -p rag-demos --example chat -- --config demos/data/agent.toml`
//!
//! Commands: `/summary` prints the agent configuration, `/quit` exits.

#[path = "../common/backends.rs"]
mod backends;

use std::path::PathBuf;

use clap::Parser;
use rag_agent::{AgentConfig, RagAgent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Ask questions about local documents")]
struct Args {
    /// Agent configuration file (TOML).
    #[arg(long, default_value = "demos/data/agent.toml")]
    config: PathBuf,

    /// Documents to load instead of those in the configuration file.
    #[arg(long = "document")]
    documents: Vec<PathBuf>,

    /// Override the chunk size.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Override the chunk overlap.
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Override the number of retrieved chunks.
    #[arg(long)]
    top_k: Option<usize>,
}

fn load_config(args: &Args) -> anyhow::Result<AgentConfig> {
    let mut config = AgentConfig::load(&args.config)?;
    if !args.documents.is_empty() {
        config.document_paths = args.documents.clone();
    }
    if let Some(size) = args.chunk_size {
        config.rag.chunk_size = size;
    }
    if let Some(overlap) = args.chunk_overlap {
        config.rag.chunk_overlap = overlap;
    }
    if let Some(k) = args.top_k {
        config.rag.top_k = k;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let backends = backends::select()?;

    println!("Indexing {} document(s) with {} backends...", config.document_paths.len(), backends.label);
    let agent = RagAgent::builder()
        .config(config)
        .embedding_provider(backends.embedding_provider)
        .generator(backends.generator)
        .connect()
        .await?;

    let summary = agent.summary();
    println!(
        "Ready: {} chunk(s), chunk_size={}, chunk_overlap={}, k={}",
        summary.chunk_count.unwrap_or_default(),
        summary.chunk_size,
        summary.chunk_overlap,
        summary.top_k,
    );
    println!("Ask a question (/summary, /quit).\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        match question {
            "" => continue,
            "/quit" | "/exit" => break,
            "/summary" => {
                println!("{}\n", serde_json::to_string_pretty(&agent.summary())?);
                continue;
            }
            _ => {}
        }

        match agent.ask(question).await {
            Ok(response) => println!("{response}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}
