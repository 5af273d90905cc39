//! Agent lifecycle, configuration loading and end-to-end answers.

mod common;

use std::sync::Arc;

use common::{ANSWER_JSON, GEOGRAPHY, SKY, agent_with, write_documents};
use rag_agent::mock::{MockEmbeddingProvider, MockGenerator};
use rag_agent::{
    AgentConfig, AgentState, InMemoryVectorStore, RagAgent, RagConfig, RagError, VectorIndexBuilder,
};

fn line_config() -> RagConfig {
    RagConfig::builder().chunk_size(40).chunk_overlap(0).top_k(1).build().unwrap()
}

#[tokio::test]
async fn queries_before_initialize_are_rejected() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let generator = MockGenerator::new(ANSWER_JSON);
    let agent = agent_with(&paths, line_config(), generator.clone());

    assert_eq!(agent.state(), AgentState::Uninitialized);
    let err = agent.ask("What is the capital of France?").await.err().expect("expected an error");
    assert!(matches!(err, RagError::ConfigError(_)));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn initialize_moves_to_ready_once() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let mut agent = agent_with(&paths, line_config(), MockGenerator::new(ANSWER_JSON));

    agent.initialize().await.unwrap();
    assert_eq!(agent.state(), AgentState::Ready);
    assert!(agent.is_ready());

    let err = agent.initialize().await.unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
    assert_eq!(agent.state(), AgentState::Ready);
}

#[tokio::test]
async fn failed_initialize_leaves_the_agent_uninitialized() {
    let (dir, _paths) = write_documents(&[]);
    let missing = dir.path().join("missing.txt");
    let mut agent = agent_with(&[missing], line_config(), MockGenerator::new(ANSWER_JSON));

    let err = agent.initialize().await.unwrap_err();
    assert!(matches!(err, RagError::FileAccess { .. }));
    assert_eq!(agent.state(), AgentState::Uninitialized);
}

#[tokio::test]
async fn ask_returns_the_retrieved_chunks_and_parsed_answer() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let generator = MockGenerator::new(ANSWER_JSON);
    let mut agent = agent_with(&paths, line_config(), generator.clone());
    agent.initialize().await.unwrap();

    let response = agent.ask("What is the capital of France?").await.unwrap();

    assert_eq!(response.retrieved.len(), 1);
    assert!(response.retrieved.texts()[0].starts_with("Paris"));
    let answer = response.reply.answer().expect("expected an answer");
    assert_eq!(answer.answer, "Paris is the capital of France.");
    assert_eq!(generator.call_count(), 1);

    let rendered = response.to_string();
    assert!(rendered.starts_with("Answer: Paris is the capital of France.\nCitations:\n1. "));
    assert!(rendered.contains("Retrieved Document References:\nReference 1: Paris is the capital of France..."));
}

#[tokio::test]
async fn parse_errors_are_shown_without_references() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let mut agent = agent_with(&paths, line_config(), MockGenerator::new("not json"));
    agent.initialize().await.unwrap();

    let response = agent.ask("What is the capital of France?").await.unwrap();

    assert!(response.reply.is_parse_error());
    let rendered = response.to_string();
    assert!(rendered.contains("not json"));
    assert!(!rendered.contains("Retrieved Document References"));
}

#[tokio::test]
async fn summary_reports_configuration_and_chunk_count() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY), ("sky.txt", SKY)]);
    let mut agent = agent_with(&paths, line_config(), MockGenerator::new(ANSWER_JSON));

    let before = agent.summary();
    assert_eq!(before.state, AgentState::Uninitialized);
    assert_eq!(before.chunk_count, None);
    assert_eq!(before.document_paths, paths);

    agent.initialize().await.unwrap();
    let after = agent.summary();
    assert_eq!(after.state, AgentState::Ready);
    assert_eq!(after.chunk_size, 40);
    assert_eq!(after.chunk_overlap, 0);
    assert_eq!(after.top_k, 1);
    assert_eq!(after.chunk_count, Some(4));
    assert_eq!(after.index_backend, "InMemory");
    assert_eq!(after.generator, "Mock");
}

#[tokio::test]
async fn builder_requires_backends() {
    let missing_generator = RagAgent::builder()
        .embedding_provider(Arc::new(MockEmbeddingProvider::default()))
        .build();
    assert!(matches!(missing_generator.err(), Some(RagError::ConfigError(_))));

    let missing_index = RagAgent::builder().generator(Arc::new(MockGenerator::new("{}"))).build();
    assert!(matches!(missing_index.err(), Some(RagError::ConfigError(_))));
}

#[tokio::test]
async fn vector_store_cannot_be_combined_with_an_index_builder() {
    let embedder = Arc::new(MockEmbeddingProvider::default());
    let result = RagAgent::builder()
        .index_builder(Arc::new(VectorIndexBuilder::new(embedder)))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .generator(Arc::new(MockGenerator::new(ANSWER_JSON)))
        .build();

    assert!(matches!(result.err(), Some(RagError::ConfigError(_))));
}

#[tokio::test]
async fn connect_loads_documents_named_in_a_toml_file() {
    let (dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let config_path = dir.path().join("agent.toml");
    let toml = format!(
        "document_paths = [{:?}]\n\n[rag]\nchunk_size = 40\nchunk_overlap = 0\ntop_k = 2\n",
        paths[0].display().to_string()
    );
    std::fs::write(&config_path, toml).unwrap();

    let config = AgentConfig::load(&config_path).unwrap();
    let agent = RagAgent::builder()
        .config(config)
        .embedding_provider(Arc::new(MockEmbeddingProvider::default()))
        .generator(Arc::new(MockGenerator::new(ANSWER_JSON)))
        .connect()
        .await
        .unwrap();

    assert!(agent.is_ready());
    let retrieved = agent.retrieve("capital of France").await.unwrap();
    assert_eq!(retrieved.len(), 2);
    assert!(retrieved.texts()[0].starts_with("Paris"));
}

#[tokio::test]
async fn answer_returns_only_the_reply() {
    let (_dir, paths) = write_documents(&[("sky.txt", SKY)]);
    let generator = MockGenerator::new(
        r#"{"answer": "No relevant information available.", "citations": []}"#,
    );
    let agent = RagAgent::builder()
        .document_paths(paths)
        .embedding_provider(Arc::new(MockEmbeddingProvider::default()))
        .generator(Arc::new(generator))
        .connect()
        .await
        .unwrap();

    let reply = agent.answer("Who painted the Mona Lisa?").await.unwrap();
    assert!(reply.answer().is_some_and(|a| a.is_fallback()));
}
