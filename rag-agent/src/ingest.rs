//! Document ingestion: read → chunk → index.
//!
//! The [`Ingestor`] validates its chunking parameters up front, reads every
//! source document before touching any backend, and submits the chunks of all
//! documents to the [`IndexBuilder`] in a single call.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_agent::{Ingestor, VectorIndexBuilder};
//!
//! let builder = VectorIndexBuilder::new(Arc::new(my_embedder));
//! let index = Ingestor::new(500, 50)?.build(&["handbook.txt"], &builder).await?;
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::validate_chunking;
use crate::document::{Chunk, Document};
use crate::error::Result;
use crate::index::{EmbeddingIndex, IndexBuilder};

/// Builds an [`EmbeddingIndex`] from source documents.
pub struct Ingestor {
    chunk_size: usize,
    chunk_overlap: usize,
    chunker: Arc<dyn Chunker>,
}

impl Ingestor {
    /// Create an ingestor using a [`RecursiveChunker`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            chunker: Arc::new(RecursiveChunker::new(chunk_size, chunk_overlap)),
        })
    }

    /// Replace the chunking strategy.
    ///
    /// The chunker should be configured with the same size and overlap as
    /// this ingestor; those values are what the agent reports.
    pub fn with_chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Maximum chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Read every document, failing on the first one that cannot be read.
    ///
    /// A path listed more than once is read once, at its first position.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::FileAccess`](crate::RagError::FileAccess) naming the
    /// offending path.
    pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>> {
        let mut seen = HashSet::new();
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            if !seen.insert(path) {
                warn!(path = %path.display(), "skipping duplicate document path");
                continue;
            }
            documents.push(Document::from_path(path)?);
        }
        Ok(documents)
    }

    /// Chunk documents in order, concatenating their chunks.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.chunker.chunk(document);
            info!(document.id = %document.id, chunk_count = chunks.len(), "chunked document");
            all_chunks.extend(chunks);
        }
        all_chunks
    }

    /// Read, chunk and index the given documents.
    ///
    /// No backend call is made unless every document was read successfully.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::FileAccess`](crate::RagError::FileAccess) for an
    /// unreadable document. Errors from the index builder are returned as is.
    pub async fn build<P: AsRef<Path>>(
        &self,
        document_paths: &[P],
        index_builder: &dyn IndexBuilder,
    ) -> Result<Arc<dyn EmbeddingIndex>> {
        let documents = Self::load_documents(document_paths)?;
        self.build_from_documents(&documents, index_builder).await
    }

    /// Chunk and index documents that are already in memory.
    pub async fn build_from_documents(
        &self,
        documents: &[Document],
        index_builder: &dyn IndexBuilder,
    ) -> Result<Arc<dyn EmbeddingIndex>> {
        if documents.is_empty() {
            warn!("building an index without any documents");
        }

        let chunks = self.chunk_documents(documents);
        let chunk_count = chunks.len();
        let index = index_builder.build_index(chunks).await?;

        info!(
            document_count = documents.len(),
            chunk_count,
            chunk_size = self.chunk_size,
            chunk_overlap = self.chunk_overlap,
            "ingestion complete"
        );

        Ok(index)
    }
}

/// Read, chunk and index `document_paths` with a [`RecursiveChunker`].
///
/// Parameters are validated before any file is read, and files are read
/// before any backend call.
pub async fn build<P: AsRef<Path>>(
    document_paths: &[P],
    chunk_size: usize,
    chunk_overlap: usize,
    index_builder: &dyn IndexBuilder,
) -> Result<Arc<dyn EmbeddingIndex>> {
    Ingestor::new(chunk_size, chunk_overlap)?.build(document_paths, index_builder).await
}
