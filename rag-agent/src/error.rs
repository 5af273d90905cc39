//! Error types for the `rag-agent` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
///
/// A generation backend returning text that is not a valid answer is *not*
/// an error; see [`Reply::ParseError`](crate::responder::Reply::ParseError).
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid construction parameters or an operation issued in the wrong state.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A source document could not be read as UTF-8 text.
    #[error("Cannot read document '{}': {source}", path.display())]
    FileAccess {
        /// The path that failed to load.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The text-generation backend call failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Whether this error came from an embedding, indexing, or generation backend.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingError { .. }
                | Self::VectorStoreError { .. }
                | Self::GenerationError { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
