//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rag_agent::mock::{MockEmbeddingProvider, MockGenerator};
use rag_agent::{
    Chunk, EmbeddingIndex, EmbeddingProvider, IndexBuilder, RagAgent, RagConfig, RagError, Result,
    VectorIndexBuilder,
};
use tempfile::TempDir;

pub const GEOGRAPHY: &str = "Paris is the capital of France.\n\
Berlin is the capital of Germany.\n\
Madrid is the capital of Spain.";

pub const SKY: &str = "The sky is blue. Grass is green.";

pub const ANSWER_JSON: &str =
    r#"{"answer": "Paris is the capital of France.", "citations": ["Paris is the capital of France."]}"#;

/// Write `files` into a fresh temporary directory.
pub fn write_documents(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = files
        .iter()
        .map(|(name, text)| {
            let path = dir.path().join(name);
            std::fs::write(&path, text).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

/// Wraps an embedding provider and counts calls.
pub struct CountingEmbeddingProvider {
    inner: MockEmbeddingProvider,
    pub embed_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl CountingEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            inner: MockEmbeddingProvider::default(),
            embed_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.inner.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// An embedding provider that always fails.
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "Failing".to_string(),
            message: "service unavailable".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Records every batch handed to it, then delegates to a [`VectorIndexBuilder`].
pub struct RecordingIndexBuilder {
    inner: VectorIndexBuilder,
    pub batches: std::sync::Mutex<Vec<Vec<Chunk>>>,
}

impl RecordingIndexBuilder {
    pub fn new() -> Self {
        Self {
            inner: VectorIndexBuilder::new(Arc::new(MockEmbeddingProvider::default())),
            batches: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn chunk_texts(&self) -> Vec<String> {
        self.batches.lock().unwrap().iter().flatten().map(|c| c.text.clone()).collect()
    }
}

#[async_trait]
impl IndexBuilder for RecordingIndexBuilder {
    async fn build_index(&self, chunks: Vec<Chunk>) -> Result<Arc<dyn EmbeddingIndex>> {
        self.batches.lock().unwrap().push(chunks.clone());
        self.inner.build_index(chunks).await
    }
}

/// Build an in-memory index over `text` with the default mock embedder.
pub async fn index_for(text: &str, chunk_size: usize, chunk_overlap: usize) -> Arc<dyn EmbeddingIndex> {
    let document = rag_agent::Document::new("doc", text);
    let builder = VectorIndexBuilder::new(Arc::new(MockEmbeddingProvider::default()));
    rag_agent::Ingestor::new(chunk_size, chunk_overlap)
        .unwrap()
        .build_from_documents(&[document], &builder)
        .await
        .unwrap()
}

/// An uninitialized agent over `paths` answering with `generator`.
pub fn agent_with(paths: &[PathBuf], config: RagConfig, generator: MockGenerator) -> RagAgent {
    RagAgent::builder()
        .document_paths(paths.iter().cloned())
        .rag_config(config)
        .embedding_provider(Arc::new(MockEmbeddingProvider::default()))
        .generator(Arc::new(generator))
        .build()
        .unwrap()
}
