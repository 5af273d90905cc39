//! Prompt templates for grounded, JSON-formatted answers.

use crate::error::{RagError, Result};

/// The answer the model is told to give when the context does not help.
pub const FALLBACK_ANSWER: &str = "No relevant information available.";

/// Placeholder replaced by the newline-joined retrieved chunks.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Placeholder replaced by the user's question.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// The built-in template.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a question-answering assistant. Answer the question using ONLY the context below. Do not use outside knowledge.

Respond with a single JSON object and nothing else. The object must have exactly two fields:
- "answer": a string containing your answer
- "citations": an array of strings, each quoting or summarizing the part of the context that supports the answer, in the order you used them

If the context does not contain information relevant to the question, respond with exactly:
{"answer": "No relevant information available.", "citations": []}

Context:
{context}

Question: {query}

JSON:"#;

/// A prompt with `{context}` and `{query}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_PROMPT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// Create a template, checking that both placeholders are present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `{context}` or `{query}` is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUERY_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt template must contain the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute the placeholders in a single left-to-right pass.
    ///
    /// Placeholder text inside `context` or `query` is copied verbatim.
    pub fn render(&self, context: &str, query: &str) -> String {
        let mut rendered = String::with_capacity(self.template.len() + context.len() + query.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            rendered.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                rendered.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUERY_PLACEHOLDER) {
                rendered.push_str(query);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
        rendered.push_str(rest);

        rendered
    }
}
