//! # rag-agent
//!
//! Retrieval-augmented question answering over local text documents.
//!
//! ## Overview
//!
//! An agent answers questions in three stages:
//!
//! - [`Ingestor`] - reads documents, splits them into overlapping chunks and
//!   builds an [`EmbeddingIndex`]
//! - [`retrieve`] - finds the `k` chunks most similar to a query
//! - [`Responder`] - renders a grounded prompt, calls a [`TextGenerator`] once
//!   and parses the JSON reply into an [`Answer`] with citations, or a
//!   [`ParseError`] carrying the raw output
//!
//! [`RagAgent`] wires the three together behind a builder and a TOML
//! [`AgentConfig`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rag_agent::{RagAgent, RagConfig};
//! use rag_agent::mock::{MockEmbeddingProvider, MockGenerator};
//!
//! let agent = RagAgent::builder()
//!     .document_path("facts.txt")
//!     .rag_config(RagConfig::default())
//!     .embedding_provider(Arc::new(MockEmbeddingProvider::default()))
//!     .generator(Arc::new(MockGenerator::new(r#"{"answer": "Paris.", "citations": []}"#)))
//!     .connect()
//!     .await?;
//!
//! println!("{}", agent.ask("What is the capital of France?").await?);
//! ```
//!
//! ## Features
//!
//! | Feature | Backend |
//! |---------|---------|
//! | *(default)* | [`InMemoryVectorStore`], [`mock`] backends |
//! | `openai` | OpenAI embeddings and chat completions |
//! | `full` | All of the above |

pub mod agent;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod inmemory;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;
pub mod responder;
pub mod retrieve;
pub mod vectorstore;

pub use agent::{AgentResponse, AgentState, AgentSummary, RagAgent, RagAgentBuilder};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{AgentConfig, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use eval::{EvalCase, EvalReport, Evaluator};
pub use generation::TextGenerator;
pub use index::{EmbeddingIndex, IndexBuilder, VectorIndexBuilder};
pub use ingest::Ingestor;
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatGenerator, OpenAIEmbeddingProvider};
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, FALLBACK_ANSWER, PromptTemplate};
pub use responder::{Answer, ParseError, Reply, Responder, parse_reply};
pub use retrieve::{RetrievalResult, retrieve};
pub use vectorstore::VectorStore;
