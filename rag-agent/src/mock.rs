//! Offline backends for tests and demos.
//!
//! [`MockEmbeddingProvider`] hashes words into a fixed number of buckets, so
//! texts sharing vocabulary land close together without any model.
//! [`MockGenerator`] returns scripted output and records every prompt it sees.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// A deterministic bag-of-words embedding provider.
///
/// Words are lowercased alphanumeric runs; each one adds 1.0 to the bucket its
/// FNV-1a hash selects.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` buckets (at least one).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dimensions];
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let bucket = (fnv1a(word.as_bytes()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "MockEmbedding"
    }
}

type Script = dyn Fn(&str) -> Result<String> + Send + Sync;

/// A [`TextGenerator`] whose output is decided by a closure.
#[derive(Clone)]
pub struct MockGenerator {
    script: Arc<Script>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    /// Always return `output`.
    pub fn new(output: impl Into<String>) -> Self {
        let output = output.into();
        Self::from_fn(move |_| Ok(output.clone()))
    }

    /// Always fail with a [`RagError::GenerationError`].
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_| {
            Err(RagError::GenerationError { provider: "Mock".to_string(), message: message.clone() })
        })
    }

    /// Compute each reply from the prompt.
    pub fn from_fn<F>(script: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self { script: Arc::new(script), prompts: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

impl std::fmt::Debug for MockGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGenerator").field("call_count", &self.call_count()).finish()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        (self.script)(prompt)
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::cosine_similarity;

    #[tokio::test]
    async fn shared_words_score_higher() {
        let provider = MockEmbeddingProvider::default();
        let query = provider.embed("capital of France").await.unwrap();
        let near = provider.embed("Paris is the capital of France.").await.unwrap();
        let far = provider.embed("Bananas are yellow.").await.unwrap();
        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[tokio::test]
    async fn generator_records_prompts() {
        let generator = MockGenerator::new("{}");
        generator.generate("first").await.unwrap();
        generator.generate("second").await.unwrap();
        assert_eq!(generator.prompts(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_generator_reports_generation_error() {
        let generator = MockGenerator::failing("quota exceeded");
        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, RagError::GenerationError { .. }));
        assert_eq!(generator.call_count(), 1);
    }
}
