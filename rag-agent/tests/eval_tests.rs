//! Evaluation runs over a ready agent.

mod common;

use common::{GEOGRAPHY, agent_with, write_documents};
use rag_agent::mock::MockGenerator;
use rag_agent::{EvalCase, EvalReport, Evaluator, RagConfig};

/// Answers by citing the first line of the prompt's context.
fn citing_generator() -> MockGenerator {
    MockGenerator::from_fn(|prompt| {
        let context = prompt.split("Context:\n").nth(1).unwrap_or_default();
        let first_line = context.lines().next().unwrap_or_default().trim();
        Ok(serde_json::json!({ "answer": first_line, "citations": [first_line] }).to_string())
    })
}

fn cases() -> Vec<EvalCase> {
    vec![
        EvalCase::new("What is the capital of France?", ["Paris", "France"])
            .with_expected_output("Paris"),
        EvalCase::new("What is the capital of Spain?", ["Madrid", "Lisbon"]),
    ]
}

#[tokio::test]
async fn report_aggregates_case_scores() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let config = RagConfig::builder().chunk_size(40).chunk_overlap(0).top_k(1).build().unwrap();
    let mut agent = agent_with(&paths, config, citing_generator());
    agent.initialize().await.unwrap();

    let report = Evaluator::new().run(&agent, &cases()).await.unwrap();

    assert_eq!(report.chunk_size, 40);
    assert_eq!(report.top_k, 1);
    assert_eq!(report.cases.len(), 2);
    assert_eq!(report.cases[0].context_keyword_recall, 1.0);
    assert_eq!(report.cases[1].context_keyword_recall, 0.5);
    assert_eq!(report.mean_context_keyword_recall, 0.75);
    assert_eq!(report.mean_citation_grounding, 1.0);
    assert_eq!(report.answer_rate, 1.0);
    assert_eq!(report.parse_error_rate, 0.0);
    assert_eq!(report.cases[0].expected_output.as_deref(), Some("Paris"));
}

#[tokio::test]
async fn unparsable_output_counts_against_the_answer_rate() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let mut agent = agent_with(&paths, RagConfig::default(), MockGenerator::new("not json"));
    agent.initialize().await.unwrap();

    let report = Evaluator::new().run(&agent, &cases()).await.unwrap();

    assert_eq!(report.parse_error_rate, 1.0);
    assert_eq!(report.answer_rate, 0.0);
    assert!(report.cases.iter().all(|c| c.actual_output == "not json"));
}

#[tokio::test]
async fn report_round_trips_through_json() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let mut agent = agent_with(&paths, RagConfig::default(), citing_generator());
    agent.initialize().await.unwrap();

    let report = Evaluator::new().run(&agent, &cases()).await.unwrap();
    let json = report.to_json_pretty().unwrap();
    let parsed: EvalReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
}

#[tokio::test]
async fn evaluating_an_uninitialized_agent_fails() {
    let (_dir, paths) = write_documents(&[("geo.txt", GEOGRAPHY)]);
    let agent = agent_with(&paths, RagConfig::default(), citing_generator());

    assert!(Evaluator::new().run(&agent, &cases()).await.is_err());
}
