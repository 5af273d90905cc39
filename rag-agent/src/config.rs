//! Configuration for the RAG agent.
//!
//! [`RagConfig`] holds the chunking, retrieval and prompting parameters and is
//! validated by [`RagConfigBuilder::build`]. [`AgentConfig`] adds the list of
//! source documents and can be loaded from a TOML file:
//!
//! ```toml
//! document_paths = ["neurolink-system.txt"]
//!
//! [rag]
//! chunk_size = 500
//! chunk_overlap = 50
//! top_k = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::prompt::PromptTemplate;

/// Configuration parameters for ingestion, retrieval and answering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks to retrieve per query.
    pub top_k: usize,
    /// Minimum similarity score for retrieved chunks. `None` keeps everything
    /// the index returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Prompt template override with `{context}` and `{query}` placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 2,
            similarity_threshold: None,
            prompt_template: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `prompt_template` lacks a `{context}` or `{query}` placeholder
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if let Some(template) = &self.prompt_template {
            PromptTemplate::new(template.clone())?;
        }
        Ok(())
    }

    /// The prompt template to render, falling back to the built-in default.
    pub fn template(&self) -> Result<PromptTemplate> {
        match &self.prompt_template {
            Some(template) => PromptTemplate::new(template.clone()),
            None => Ok(PromptTemplate::default()),
        }
    }
}

/// Validate a chunk size / overlap pair.
pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ConfigError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks to retrieve per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Override the built-in prompt template.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Agent configuration: which documents to load plus the [`RagConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Source documents, read as UTF-8 text at initialization.
    pub document_paths: Vec<PathBuf>,
    /// Chunking, retrieval and prompting parameters.
    #[serde(default)]
    pub rag: RagConfig,
}

impl AgentConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| RagError::ConfigError(format!("invalid agent configuration: {e}")))?;
        config.rag.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|source| RagError::FileAccess { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&source)
    }
}
