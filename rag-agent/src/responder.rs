//! Answer generation: prompt → model → parsed [`Reply`].
//!
//! The model is asked for a JSON object with `answer` and `citations`. Output
//! that does not match is never an error: it comes back as
//! [`Reply::ParseError`] with the raw text attached, so callers can show it.
//! Only a failed backend call produces `Err`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::generation::TextGenerator;
use crate::prompt::{FALLBACK_ANSWER, PromptTemplate};
use crate::retrieve::RetrievalResult;

/// A structured answer with supporting citations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    /// Free-text answer.
    pub answer: String,
    /// Excerpts or summaries of the retrieved text backing the answer, in order.
    pub citations: Vec<String>,
}

impl Answer {
    /// The payload the model is told to return when the context is irrelevant.
    pub fn fallback() -> Self {
        Self { answer: FALLBACK_ANSWER.to_string(), citations: Vec::new() }
    }

    /// Whether this is the "no relevant information" payload.
    pub fn is_fallback(&self) -> bool {
        self.answer.trim() == FALLBACK_ANSWER
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Answer: {}", self.answer)?;
        if !self.citations.is_empty() {
            write!(f, "\nCitations:")?;
            for (i, citation) in self.citations.iter().enumerate() {
                write!(f, "\n{}. {citation}", i + 1)?;
            }
        }
        Ok(())
    }
}

/// Model output that could not be read as an [`Answer`].
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("model output is not a valid answer: {reason}")]
pub struct ParseError {
    /// The model output exactly as received.
    pub raw_output: String,
    /// Why parsing failed.
    pub reason: String,
}

/// The outcome of asking the model: an answer, or its unparsable output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    /// The model returned a well-formed answer.
    Answer(Answer),
    /// The model returned something else.
    ParseError(ParseError),
}

impl Reply {
    /// The answer, if parsing succeeded.
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Answer(answer) => Some(answer),
            Self::ParseError(_) => None,
        }
    }

    /// Whether the model output could not be parsed.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> std::result::Result<Answer, ParseError> {
        match self {
            Self::Answer(answer) => Ok(answer),
            Self::ParseError(err) => Err(err),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answer(answer) => fmt::Display::fmt(answer, f),
            Self::ParseError(err) => write!(f, "Error: {err}\n{}", err.raw_output),
        }
    }
}

/// Take the body of a Markdown code fence, if the text is one.
fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```").and_then(|rest| rest.strip_suffix("```")) else {
        return text;
    };
    // The opening line may carry an info string such as `json`.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

/// Interpret raw model output as a [`Reply`].
///
/// Accepts a JSON object with a string `answer` and an array-of-strings
/// `citations`, optionally wrapped in a code fence. Extra fields are ignored.
pub fn parse_reply(raw_output: &str) -> Reply {
    let body = strip_code_fence(raw_output.trim());
    match serde_json::from_str::<Answer>(body) {
        Ok(answer) => Reply::Answer(answer),
        Err(e) => {
            warn!(error = %e, output_len = raw_output.len(), "model output is not a valid answer");
            Reply::ParseError(ParseError {
                raw_output: raw_output.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Renders prompts, calls the generator once, and parses the reply.
pub struct Responder {
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
}

impl Responder {
    /// Create a responder using the built-in prompt template.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator, template: PromptTemplate::default() }
    }

    /// Use a different prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Return a reference to the text generator.
    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Return a reference to the prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Answer `query` from the retrieved chunks.
    ///
    /// # Errors
    ///
    /// Returns the generator's error if the backend call fails. Unparsable
    /// output is returned as `Ok(Reply::ParseError(_))`.
    pub async fn answer(&self, query: &str, retrieved: &RetrievalResult) -> Result<Reply> {
        answer(query, retrieved, self.generator.as_ref(), Some(&self.template)).await
    }
}

/// Answer `query` from `retrieved` with a single generator call.
///
/// Uses the built-in template when `template` is `None`.
pub async fn answer(
    query: &str,
    retrieved: &RetrievalResult,
    generator: &dyn TextGenerator,
    template: Option<&PromptTemplate>,
) -> Result<Reply> {
    let default_template;
    let template = match template {
        Some(template) => template,
        None => {
            default_template = PromptTemplate::default();
            &default_template
        }
    };

    let prompt = template.render(&retrieved.context(), query);
    debug!(generator = generator.name(), prompt_len = prompt.len(), "generating answer");

    let raw_output = generator.generate(&prompt).await.map_err(|e| {
        error!(generator = generator.name(), error = %e, "generation failed");
        e
    })?;

    Ok(parse_reply(&raw_output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let reply = parse_reply(r#"{"answer": "Blue.", "citations": ["The sky is blue."]}"#);
        assert_eq!(
            reply,
            Reply::Answer(Answer {
                answer: "Blue.".to_string(),
                citations: vec!["The sky is blue.".to_string()],
            })
        );
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"answer\": \"Blue.\", \"citations\": []}\n```";
        assert_eq!(reply_answer(raw), "Blue.");
    }

    #[test]
    fn ignores_extra_fields() {
        let raw = r#"{"answer": "Blue.", "citations": [], "confidence": 0.9}"#;
        assert_eq!(reply_answer(raw), "Blue.");
    }

    #[test]
    fn missing_citations_is_a_parse_error() {
        let reply = parse_reply(r#"{"answer": "Blue."}"#);
        assert!(reply.is_parse_error());
    }

    #[test]
    fn non_string_citations_are_a_parse_error() {
        let reply = parse_reply(r#"{"answer": "Blue.", "citations": [1, 2]}"#);
        assert!(reply.is_parse_error());
    }

    #[test]
    fn parse_error_keeps_raw_output_verbatim() {
        let raw = "  Sorry, I can't help.  ";
        match parse_reply(raw) {
            Reply::ParseError(err) => assert_eq!(err.raw_output, raw),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn display_numbers_citations() {
        let answer = Answer {
            answer: "Paris.".to_string(),
            citations: vec!["Paris is the capital of France.".to_string()],
        };
        assert_eq!(answer.to_string(), "Answer: Paris.\nCitations:\n1. Paris is the capital of France.");
    }

    fn reply_answer(raw: &str) -> String {
        parse_reply(raw).answer().map(|a| a.answer.clone()).unwrap_or_default()
    }
}
