//! Backend selection shared by the demos.
//!
//! With the `openai` feature and `OPENAI_API_KEY` set, the demos use OpenAI
//! embeddings and chat completions. Otherwise they fall back to the offline
//! mock embedder and a generator that cites the first retrieved chunk.

use std::sync::Arc;

use rag_agent::mock::{MockEmbeddingProvider, MockGenerator};
use rag_agent::{EmbeddingProvider, TextGenerator};

pub struct Backends {
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn TextGenerator>,
    pub label: &'static str,
}

/// An offline generator that quotes the first retrieved chunk.
fn extractive_generator() -> MockGenerator {
    MockGenerator::from_fn(|prompt| {
        let context = prompt
            .split("Context:\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\nQuestion:").next())
            .unwrap_or_default();
        let first = context.lines().map(str::trim).find(|line| !line.is_empty());
        let payload = match first {
            Some(line) => serde_json::json!({ "answer": line, "citations": [line] }),
            None => serde_json::json!({ "answer": rag_agent::FALLBACK_ANSWER, "citations": [] }),
        };
        Ok(payload.to_string())
    })
}

fn offline() -> Backends {
    Backends {
        embedding_provider: Arc::new(MockEmbeddingProvider::default()),
        generator: Arc::new(extractive_generator()),
        label: "offline mock",
    }
}

#[cfg(feature = "openai")]
pub fn select() -> anyhow::Result<Backends> {
    use rag_agent::openai::{OpenAIChatGenerator, OpenAIEmbeddingProvider};

    if std::env::var("OPENAI_API_KEY").is_err() {
        tracing::warn!("OPENAI_API_KEY not set, using offline backends");
        return Ok(offline());
    }
    Ok(Backends {
        embedding_provider: Arc::new(OpenAIEmbeddingProvider::from_env()?),
        generator: Arc::new(OpenAIChatGenerator::from_env()?.with_temperature(0.0)),
        label: "OpenAI",
    })
}

#[cfg(not(feature = "openai"))]
pub fn select() -> anyhow::Result<Backends> {
    Ok(offline())
}
