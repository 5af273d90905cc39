//! Text-generation backend trait.

use async_trait::async_trait;

use crate::error::Result;

/// A language model that turns a prompt into raw text.
///
/// No structured-output guarantee is expected from implementations; the
/// [`Responder`](crate::Responder) parses whatever comes back.
///
/// # Example
///
/// ```rust,ignore
/// use rag_agent::TextGenerator;
///
/// let raw = generator.generate("Say hello as JSON").await?;
/// ```
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// Failures (network, auth, quota, malformed transport response) are
    /// reported as [`RagError::GenerationError`](crate::RagError::GenerationError).
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A display name for logs and agent summaries.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
