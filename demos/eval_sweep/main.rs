//! # Chunk Size Evaluation Sweep
//!
//! Builds one agent per chunk size, runs the same evaluation cases against
//! each, and writes every report to a single JSON file so the settings can be
//! compared side by side.
//!
//! Runs offline by default. Build with `--features openai` and set
//! `OPENAI_API_KEY` to evaluate real models.
//!
//! Run: `cargo run -p rag-demos --example eval_sweep`

#[path = "../common/backends.rs"]
mod backends;

use std::path::PathBuf;

use clap::Parser;
use rag_agent::{EvalCase, EvalReport, Evaluator, RagAgent, RagConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Compare chunk sizes on a fixed set of questions")]
struct Args {
    /// Documents to index.
    #[arg(long = "document", default_value = "demos/data/neurolink-system.txt")]
    documents: Vec<PathBuf>,

    /// Evaluation cases (JSON array of `{input, expected_output, context_keywords}`).
    #[arg(long, default_value = "demos/data/eval_cases.json")]
    cases: PathBuf,

    /// Chunk sizes to compare.
    #[arg(long = "chunk-size", default_values_t = [500, 1024, 2048])]
    chunk_sizes: Vec<usize>,

    /// Where to write the combined results.
    #[arg(long, default_value = "chunking_evaluation_results.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cases: Vec<EvalCase> = serde_json::from_str(&std::fs::read_to_string(&args.cases)?)?;
    let backends = backends::select()?;
    println!("Evaluating {} case(s) with {} backends", cases.len(), backends.label);

    let mut reports: Vec<EvalReport> = Vec::with_capacity(args.chunk_sizes.len());
    for &chunk_size in &args.chunk_sizes {
        println!("\n=== chunk_size={chunk_size} ===");

        let config = RagConfig::builder().chunk_size(chunk_size).build()?;
        let agent = RagAgent::builder()
            .document_paths(args.documents.iter().cloned())
            .rag_config(config)
            .embedding_provider(backends.embedding_provider.clone())
            .generator(backends.generator.clone())
            .connect()
            .await?;

        let report = Evaluator::new().run(&agent, &cases).await?;
        println!(
            "  chunks={}  keyword recall={:.2}  citation grounding={:.2}  answered={:.0}%",
            agent.summary().chunk_count.unwrap_or_default(),
            report.mean_context_keyword_recall,
            report.mean_citation_grounding,
            report.answer_rate * 100.0,
        );
        reports.push(report);
    }

    std::fs::write(&args.output, serde_json::to_string_pretty(&reports)?)?;
    println!("\nResults saved to {}", args.output.display());
    Ok(())
}
