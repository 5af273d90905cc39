//! Lightweight evaluation of an agent over a set of questions.
//!
//! Scores are lexical and need no judge model:
//!
//! - **context keyword recall**: share of a case's expected keywords that
//!   appear in the retrieved context;
//! - **citation grounding**: share of the answer's citations that appear
//!   verbatim in the retrieved context;
//! - **answered**: the model gave an answer other than the fallback.
//!
//! All matching is case-insensitive.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_agent::eval::{EvalCase, Evaluator};
//!
//! let cases = vec![EvalCase::new("How is data transmitted?", ["wireless", "Bluetooth"])];
//! let report = Evaluator::new().run(&agent, &cases).await?;
//! std::fs::write("report.json", report.to_json_pretty()?)?;
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::RagAgent;
use crate::error::{RagError, Result};
use crate::responder::Reply;

/// One evaluation question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalCase {
    /// The question sent to the agent.
    pub input: String,
    /// A reference answer, kept in the report for human comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// Terms the retrieved context should contain.
    #[serde(default)]
    pub context_keywords: Vec<String>,
}

impl EvalCase {
    /// Create a case with keywords and no reference answer.
    pub fn new<I, S>(input: impl Into<String>, context_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into(),
            expected_output: None,
            context_keywords: context_keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a reference answer.
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }
}

/// Scores for one [`EvalCase`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    /// The question.
    pub input: String,
    /// The reference answer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// The answer text, or the raw model output when it could not be parsed.
    pub actual_output: String,
    /// The retrieved chunk texts.
    pub retrieval_context: Vec<String>,
    /// Whether the model output parsed as an answer.
    pub parsed: bool,
    /// Whether the answer is something other than the fallback.
    pub answered: bool,
    /// Share of expected keywords found in the retrieved context.
    pub context_keyword_recall: f64,
    /// Share of citations found in the retrieved context.
    pub citation_grounding: f64,
}

/// Aggregate results of an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalReport {
    /// Chunk size the agent ran with.
    pub chunk_size: usize,
    /// Chunk overlap the agent ran with.
    pub chunk_overlap: usize,
    /// Chunks retrieved per query.
    pub top_k: usize,
    /// Per-case results, in input order.
    pub cases: Vec<CaseResult>,
    /// Mean context keyword recall.
    pub mean_context_keyword_recall: f64,
    /// Mean citation grounding.
    pub mean_citation_grounding: f64,
    /// Share of cases the agent answered.
    pub answer_rate: f64,
    /// Share of cases whose model output could not be parsed.
    pub parse_error_rate: f64,
}

impl EvalReport {
    /// Serialize as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("cannot serialize report: {e}")))
    }
}

/// Share of `keywords` that occur in `context`. 1.0 when there are none.
pub fn context_keyword_recall(context: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 1.0;
    }
    let context = context.to_lowercase();
    let found = keywords.iter().filter(|k| context.contains(&k.to_lowercase())).count();
    found as f64 / keywords.len() as f64
}

/// Share of `citations` that occur in `context`. 1.0 when there are none.
pub fn citation_grounding(context: &str, citations: &[String]) -> f64 {
    if citations.is_empty() {
        return 1.0;
    }
    let context = context.to_lowercase();
    let found =
        citations.iter().filter(|c| context.contains(c.trim().to_lowercase().as_str())).count();
    found as f64 / citations.len() as f64
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Runs [`EvalCase`]s against a ready [`RagAgent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Create an evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Score one case.
    pub async fn evaluate_case(&self, agent: &RagAgent, case: &EvalCase) -> Result<CaseResult> {
        let response = agent.ask(&case.input).await?;
        let context = response.retrieved.context();

        let (actual_output, parsed, answered, citation_grounding) = match &response.reply {
            Reply::Answer(answer) => (
                answer.answer.clone(),
                true,
                !answer.is_fallback(),
                citation_grounding(&context, &answer.citations),
            ),
            Reply::ParseError(err) => (err.raw_output.clone(), false, false, 0.0),
        };

        Ok(CaseResult {
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output,
            retrieval_context: response.retrieved.texts().into_iter().map(str::to_string).collect(),
            parsed,
            answered,
            context_keyword_recall: context_keyword_recall(&context, &case.context_keywords),
            citation_grounding,
        })
    }

    /// Score every case in order. A backend error aborts the run.
    pub async fn run(&self, agent: &RagAgent, cases: &[EvalCase]) -> Result<EvalReport> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let result = self.evaluate_case(agent, case).await?;
            info!(
                input = %case.input,
                recall = result.context_keyword_recall,
                grounding = result.citation_grounding,
                "evaluated case"
            );
            results.push(result);
        }

        let summary = agent.summary();
        let rate = |pred: fn(&CaseResult) -> bool| {
            mean(results.iter().map(|r| if pred(r) { 1.0 } else { 0.0 }))
        };

        let report = EvalReport {
            chunk_size: summary.chunk_size,
            chunk_overlap: summary.chunk_overlap,
            top_k: summary.top_k,
            mean_context_keyword_recall: mean(results.iter().map(|r| r.context_keyword_recall)),
            mean_citation_grounding: mean(results.iter().map(|r| r.citation_grounding)),
            answer_rate: rate(|r| r.answered),
            parse_error_rate: rate(|r| !r.parsed),
            cases: results,
        };

        info!(
            cases = report.cases.len(),
            chunk_size = report.chunk_size,
            recall = report.mean_context_keyword_recall,
            "evaluation complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keyword_recall_is_case_insensitive() {
        let context = "Data is sent over Bluetooth to a smartphone.";
        let keywords = strings(&["bluetooth", "Smartphone", "computer", "wireless"]);
        assert_eq!(context_keyword_recall(context, &keywords), 0.5);
    }

    #[test]
    fn empty_keywords_score_full_recall() {
        assert_eq!(context_keyword_recall("anything", &[]), 1.0);
    }

    #[test]
    fn citation_grounding_counts_verbatim_matches() {
        let context = "Paris is the capital of France.\nBerlin is in Germany.";
        let citations = strings(&["paris is the capital of France.", "Rome is in Italy."]);
        assert_eq!(citation_grounding(context, &citations), 0.5);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(std::iter::empty::<f64>()), 0.0);
    }
}
