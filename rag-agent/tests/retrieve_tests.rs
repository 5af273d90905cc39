//! Retrieval against an in-memory index built from the mock embedder.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{FailingEmbeddingProvider, GEOGRAPHY, index_for};
use rag_agent::retrieve::retrieve_with_threshold;
use rag_agent::{EmbeddingIndex, RagError, Result, SearchResult, retrieve};

#[tokio::test]
async fn capital_question_retrieves_the_paris_chunk() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let result = retrieve(index.as_ref(), "What is the capital of France?", 1).await.unwrap();

    assert_eq!(result.len(), 1);
    assert!(result.texts()[0].contains("Paris is the capital of France."));
    assert_eq!(result.query, "What is the capital of France?");
}

#[tokio::test]
async fn returns_exactly_k_when_enough_chunks_exist() {
    let index = index_for(GEOGRAPHY, 40, 0).await;
    assert_eq!(index.len(), 3);

    let result = retrieve(index.as_ref(), "capital", 2).await.unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn returns_every_chunk_when_k_exceeds_index_size() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let result = retrieve(index.as_ref(), "capital", 10).await.unwrap();
    assert_eq!(result.len(), 3);
    for pair in result.results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn repeated_queries_return_identical_results() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let first = retrieve(index.as_ref(), "Which city is in Spain?", 2).await.unwrap();
    let second = retrieve(index.as_ref(), "Which city is in Spain?", 2).await.unwrap();
    assert_eq!(first.texts(), second.texts());
}

#[tokio::test]
async fn empty_query_is_passed_through() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let result = retrieve(index.as_ref(), "", 1).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.query, "");
}

#[tokio::test]
async fn zero_k_is_a_configuration_error() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let err = retrieve(index.as_ref(), "capital", 0).await.unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[tokio::test]
async fn threshold_drops_weak_matches() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let result =
        retrieve_with_threshold(index.as_ref(), "capital of France", 3, Some(0.6)).await.unwrap();
    assert_eq!(result.len(), 1);
    assert!(result.context().starts_with("Paris"));
}

#[tokio::test]
async fn context_joins_chunks_with_newlines() {
    let index = index_for(GEOGRAPHY, 40, 0).await;

    let result = retrieve(index.as_ref(), "capital of France", 2).await.unwrap();
    let texts = result.texts();
    assert_eq!(result.context(), format!("{}\n{}", texts[0], texts[1]));
}

/// An index that returns more results than asked for.
struct OverfullIndex(Vec<SearchResult>);

#[async_trait]
impl EmbeddingIndex for OverfullIndex {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SearchResult>> {
        Ok(self.0.clone())
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

#[tokio::test]
async fn results_are_truncated_to_k() {
    let base = index_for(GEOGRAPHY, 40, 0).await;
    let all = base.search("capital", 3).await.unwrap();
    let index = OverfullIndex(all);

    let result = retrieve(&index, "capital", 2).await.unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn query_embedding_failure_is_returned_unchanged() {
    let builder = rag_agent::VectorIndexBuilder::new(Arc::new(FailingEmbeddingProvider));
    // An empty build never calls the embedder; the query does.
    let index = rag_agent::IndexBuilder::build_index(&builder, Vec::new()).await.unwrap();

    let err = retrieve(index.as_ref(), "capital", 1).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
}
