//! Query-time retrieval of the most similar chunks.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::index::EmbeddingIndex;

/// The chunks retrieved for one query, most similar first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The query the chunks were retrieved for.
    pub query: String,
    /// Retrieved chunks in the order the index produced them.
    pub results: Vec<SearchResult>,
}

impl RetrievalResult {
    /// The text of each retrieved chunk, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.chunk.text.as_str()).collect()
    }

    /// The retrieved texts joined by newlines, as placed in the prompt.
    pub fn context(&self) -> String {
        self.texts().join("\n")
    }

    /// Number of retrieved chunks.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Retrieve the `k` chunks most similar to `query`.
///
/// Results keep the order returned by the index and are truncated to `k`.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `k == 0`. Backend failures from the
/// index are returned unchanged.
pub async fn retrieve(index: &dyn EmbeddingIndex, query: &str, k: usize) -> Result<RetrievalResult> {
    retrieve_with_threshold(index, query, k, None).await
}

/// Like [`retrieve`], dropping results scored below `threshold` when one is given.
pub async fn retrieve_with_threshold(
    index: &dyn EmbeddingIndex,
    query: &str,
    k: usize,
    threshold: Option<f32>,
) -> Result<RetrievalResult> {
    if k == 0 {
        return Err(RagError::ConfigError("k must be at least 1".to_string()));
    }

    let mut results = index.search(query, k).await?;
    results.truncate(k);
    if let Some(threshold) = threshold {
        results.retain(|r| r.score >= threshold);
    }

    info!(k, result_count = results.len(), "retrieval completed");

    Ok(RetrievalResult { query: query.to_string(), results })
}
