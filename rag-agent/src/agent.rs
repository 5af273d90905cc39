//! The RAG agent: configuration, backends, and the index they produce.
//!
//! A [`RagAgent`] starts `Uninitialized`. [`RagAgent::initialize`] reads and
//! indexes the configured documents and moves it to `Ready`; there is no way
//! back. Queries issued before that fail with a configuration error.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_agent::{RagAgent, RagConfig};
//!
//! let agent = RagAgent::builder()
//!     .document_path("neurolink-system.txt")
//!     .rag_config(RagConfig::builder().chunk_size(500).chunk_overlap(50).top_k(2).build()?)
//!     .embedding_provider(Arc::new(embedder))
//!     .generator(Arc::new(llm))
//!     .connect()
//!     .await?;
//!
//! let response = agent.ask("How much blood do you need?").await?;
//! println!("{response}");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chunking::Chunker;
use crate::config::{AgentConfig, RagConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::index::{EmbeddingIndex, IndexBuilder, VectorIndexBuilder};
use crate::ingest::Ingestor;
use crate::responder::{Reply, Responder};
use crate::retrieve::{RetrievalResult, retrieve_with_threshold};
use crate::vectorstore::VectorStore;

/// Length of the reference previews shown next to an answer.
const PREVIEW_CHARS: usize = 30;

/// Lifecycle of a [`RagAgent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Built, but documents have not been indexed yet.
    Uninitialized,
    /// The index is built and queries are accepted.
    Ready,
}

/// What the agent is running with, for display next to a chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSummary {
    /// Current lifecycle state.
    pub state: AgentState,
    /// Configured source documents.
    pub document_paths: Vec<PathBuf>,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Chunks retrieved per query.
    pub top_k: usize,
    /// Name of the index backend.
    pub index_backend: String,
    /// Name of the text generator.
    pub generator: String,
    /// Number of indexed chunks, once ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
}

/// A full answer to one question: what was retrieved and what the model said.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The question asked.
    pub query: String,
    /// The chunks placed in the prompt.
    pub retrieved: RetrievalResult,
    /// The parsed model reply.
    pub reply: Reply,
}

impl AgentResponse {
    /// Short previews of each retrieved chunk (first 30 characters, with an
    /// ellipsis when truncated).
    pub fn reference_previews(&self) -> Vec<String> {
        self.retrieved
            .texts()
            .into_iter()
            .map(|text| {
                if text.chars().count() > PREVIEW_CHARS {
                    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
                    format!("{preview}...")
                } else {
                    text.to_string()
                }
            })
            .collect()
    }
}

impl fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reply)?;
        // References are only shown alongside a successful answer.
        if self.reply.answer().is_some() && !self.retrieved.is_empty() {
            write!(f, "\nRetrieved Document References:")?;
            for (i, preview) in self.reference_previews().iter().enumerate() {
                write!(f, "\nReference {}: {preview}", i + 1)?;
            }
        }
        Ok(())
    }
}

/// A retrieval-augmented question answering agent.
///
/// Construct one via [`RagAgent::builder()`].
pub struct RagAgent {
    config: AgentConfig,
    ingestor: Ingestor,
    index_builder: Arc<dyn IndexBuilder>,
    responder: Responder,
    index: Option<Arc<dyn EmbeddingIndex>>,
}

impl RagAgent {
    /// Create a new [`RagAgentBuilder`].
    pub fn builder() -> RagAgentBuilder {
        RagAgentBuilder::default()
    }

    /// Return a reference to the agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AgentState {
        if self.index.is_some() { AgentState::Ready } else { AgentState::Uninitialized }
    }

    /// Whether queries are accepted.
    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    /// Describe the agent's configuration and backends.
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            state: self.state(),
            document_paths: self.config.document_paths.clone(),
            chunk_size: self.ingestor.chunk_size(),
            chunk_overlap: self.ingestor.chunk_overlap(),
            top_k: self.config.rag.top_k,
            index_backend: self.index_builder.name().to_string(),
            generator: self.responder.generator().name().to_string(),
            chunk_count: self.index.as_ref().map(|index| index.len()),
        }
    }

    /// Read, chunk and index the configured documents, moving to `Ready`.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigError`] if the agent is already initialized.
    /// - [`RagError::FileAccess`] if a document cannot be read; no backend
    ///   call is made in that case.
    /// - Backend errors from the index builder, unchanged.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.index.is_some() {
            return Err(RagError::ConfigError("agent is already initialized".to_string()));
        }

        let paths = self.config.document_paths.as_slice();
        let index = self.ingestor.build(paths, self.index_builder.as_ref()).await?;
        info!(
            document_count = self.config.document_paths.len(),
            chunk_count = index.len(),
            "agent ready"
        );
        self.index = Some(index);
        Ok(())
    }

    fn ready_index(&self) -> Result<&Arc<dyn EmbeddingIndex>> {
        self.index.as_ref().ok_or_else(|| {
            warn!("query issued before the agent was initialized");
            RagError::ConfigError("agent is not initialized; call initialize() first".to_string())
        })
    }

    /// Retrieve the configured number of chunks for `query`.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let index = self.ready_index()?;
        let rag = &self.config.rag;
        retrieve_with_threshold(index.as_ref(), query, rag.top_k, rag.similarity_threshold).await
    }

    /// Retrieve, then ask the model.
    ///
    /// # Errors
    ///
    /// Returns `Err` for an uninitialized agent or a failed backend call.
    /// Unparsable model output is `Ok(Reply::ParseError(_))`.
    pub async fn answer(&self, query: &str) -> Result<Reply> {
        Ok(self.ask(query).await?.reply)
    }

    /// Like [`answer`](Self::answer), also returning the retrieved chunks.
    pub async fn ask(&self, query: &str) -> Result<AgentResponse> {
        let retrieved = self.retrieve(query).await?;
        let reply = self.responder.answer(query, &retrieved).await?;
        info!(
            retrieved = retrieved.len(),
            parse_error = reply.is_parse_error(),
            "answered query"
        );
        Ok(AgentResponse { query: query.to_string(), retrieved, reply })
    }
}

/// Builder for constructing a [`RagAgent`].
///
/// A text generator is required, plus either an embedding provider (indexed
/// through a [`VectorIndexBuilder`], in memory unless a vector store is given)
/// or a complete [`IndexBuilder`].
#[derive(Default)]
pub struct RagAgentBuilder {
    document_paths: Vec<PathBuf>,
    rag_config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    index_builder: Option<Arc<dyn IndexBuilder>>,
    generator: Option<Arc<dyn TextGenerator>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagAgentBuilder {
    /// Take document paths and parameters from an [`AgentConfig`].
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.document_paths = config.document_paths;
        self.rag_config = Some(config.rag);
        self
    }

    /// Set the chunking, retrieval and prompting parameters.
    pub fn rag_config(mut self, config: RagConfig) -> Self {
        self.rag_config = Some(config);
        self
    }

    /// Add one source document.
    pub fn document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_paths.push(path.into());
        self
    }

    /// Add several source documents.
    pub fn document_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.document_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend used with the embedding provider.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Use a complete index backend instead of embedding provider + vector store.
    pub fn index_builder(mut self, builder: Arc<dyn IndexBuilder>) -> Self {
        self.index_builder = Some(builder);
        self
    }

    /// Set the text generator.
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the default [`RecursiveChunker`](crate::RecursiveChunker).
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build an `Uninitialized` [`RagAgent`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the parameters are invalid, a
    /// required backend is missing, or a vector store is given together with
    /// an index builder.
    pub fn build(self) -> Result<RagAgent> {
        let rag = self.rag_config.unwrap_or_default();
        rag.validate()?;

        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;

        if self.index_builder.is_some() && self.vector_store.is_some() {
            return Err(RagError::ConfigError(
                "vector_store cannot be combined with index_builder".to_string(),
            ));
        }

        let index_builder: Arc<dyn IndexBuilder> = match (self.index_builder, self.embedding_provider)
        {
            (Some(builder), _) => builder,
            (None, Some(provider)) => {
                let mut builder = VectorIndexBuilder::new(provider);
                if let Some(store) = self.vector_store {
                    builder = builder.with_vector_store(store);
                }
                Arc::new(builder)
            }
            (None, None) => {
                return Err(RagError::ConfigError(
                    "embedding_provider or index_builder is required".to_string(),
                ));
            }
        };

        let mut ingestor = Ingestor::new(rag.chunk_size, rag.chunk_overlap)?;
        if let Some(chunker) = self.chunker {
            ingestor = ingestor.with_chunker(chunker);
        }

        let responder = Responder::new(generator).with_template(rag.template()?);

        Ok(RagAgent {
            config: AgentConfig { document_paths: self.document_paths, rag },
            ingestor,
            index_builder,
            responder,
            index: None,
        })
    }

    /// Build and initialize in one step.
    pub async fn connect(self) -> Result<RagAgent> {
        let mut agent = self.build()?;
        agent.initialize().await?;
        Ok(agent)
    }
}
