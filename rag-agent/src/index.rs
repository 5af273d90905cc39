//! The searchable index built from document chunks.
//!
//! Ingestion and retrieval only see two narrow capabilities:
//!
//! - [`IndexBuilder`] turns a batch of chunks into an index, once.
//! - [`EmbeddingIndex`] answers "which k chunks are most similar to this text".
//!
//! [`VectorIndexBuilder`] provides both on top of any
//! [`EmbeddingProvider`] and [`VectorStore`] pair.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_agent::{InMemoryVectorStore, IndexBuilder, VectorIndexBuilder};
//!
//! let builder = VectorIndexBuilder::new(Arc::new(my_embedder))
//!     .with_vector_store(Arc::new(InMemoryVectorStore::new()));
//! let index = builder.build_index(chunks).await?;
//! let hits = index.search("what colour is the sky?", 2).await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::VectorStore;

/// A read-only index over embedded chunks.
///
/// Built once by an [`IndexBuilder`] and never mutated afterwards, so
/// implementations must tolerate concurrent `search` calls.
#[async_trait]
pub trait EmbeddingIndex: Send + Sync {
    /// Return up to `k` chunks most similar to `query`, most similar first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Number of chunks in the index.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds an [`EmbeddingIndex`] from chunks.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    /// Embed and index all chunks in a single build.
    async fn build_index(&self, chunks: Vec<Chunk>) -> Result<Arc<dyn EmbeddingIndex>>;

    /// A display name for logs and agent summaries.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// An [`IndexBuilder`] that embeds chunks with an [`EmbeddingProvider`] and
/// stores them in a [`VectorStore`].
///
/// Every build gets its own collection (`{prefix}_{n}`), so several indexes
/// can share one store without seeing each other's chunks. A build that
/// fails drops its collection again.
pub struct VectorIndexBuilder {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection_prefix: String,
    builds: AtomicUsize,
}

impl VectorIndexBuilder {
    /// Create a builder over the given embedding provider, storing vectors in
    /// an [`InMemoryVectorStore`].
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedding_provider,
            vector_store: Arc::new(InMemoryVectorStore::new()),
            collection_prefix: "segments".to_string(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Use a different vector store backend.
    pub fn with_vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = store;
        self
    }

    /// Set the prefix used for collection names.
    pub fn with_collection_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.collection_prefix = prefix.into();
        self
    }
}

impl VectorIndexBuilder {
    /// Embed `chunks` in one batch and upsert them into `collection`.
    async fn embed_and_store(&self, collection: &str, chunks: &mut [Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(
                provider = self.embedding_provider.name(),
                error = %e,
                "embedding failed during indexing"
            );
            e
        })?;

        if embeddings.len() != chunks.len() {
            error!(expected = chunks.len(), got = embeddings.len(), "embedding count mismatch");
            return Err(RagError::EmbeddingError {
                provider: self.embedding_provider.name().to_string(),
                message: format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            });
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.upsert(collection, chunks).await.map_err(|e| {
            error!(collection = %collection, error = %e, "upsert failed during indexing");
            e
        })
    }
}

#[async_trait]
impl IndexBuilder for VectorIndexBuilder {
    async fn build_index(&self, mut chunks: Vec<Chunk>) -> Result<Arc<dyn EmbeddingIndex>> {
        let build = self.builds.fetch_add(1, Ordering::Relaxed);
        let collection = format!("{}_{build}", self.collection_prefix);
        let dimensions = self.embedding_provider.dimensions();

        self.vector_store.create_collection(&collection, dimensions).await.map_err(|e| {
            error!(collection = %collection, error = %e, "failed to create collection");
            e
        })?;

        if let Err(e) = self.embed_and_store(&collection, &mut chunks).await {
            if let Err(cleanup) = self.vector_store.delete_collection(&collection).await {
                warn!(collection = %collection, error = %cleanup, "failed to drop partial collection");
            }
            return Err(e);
        }

        info!(
            collection = %collection,
            chunk_count = chunks.len(),
            store = self.vector_store.name(),
            "index built"
        );

        Ok(Arc::new(VectorIndex {
            embedding_provider: Arc::clone(&self.embedding_provider),
            vector_store: Arc::clone(&self.vector_store),
            collection,
            len: chunks.len(),
        }))
    }

    fn name(&self) -> &str {
        self.vector_store.name()
    }
}

/// An index living in one collection of a [`VectorStore`].
struct VectorIndex {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
    len: usize,
}

#[async_trait]
impl EmbeddingIndex for VectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results =
            self.vector_store.search(&self.collection, &query_embedding, k).await.map_err(|e| {
                error!(collection = %self.collection, error = %e, "vector store search failed");
                e
            })?;

        debug!(collection = %self.collection, k, result_count = results.len(), "index searched");
        Ok(results)
    }

    fn len(&self) -> usize {
        self.len
    }
}
