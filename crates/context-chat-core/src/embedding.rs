//! Embedding provider trait.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement. Concrete providers (OpenAI, Ollama, fastembed) live in the
//! `context-chat` app crate; tests use small in-process fakes.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// Implementations turn text into fixed-length vectors. Retry and
/// timeout policy belong to the implementation, not to its callers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding dimensionality if it is known up front.
    fn dims(&self) -> Option<usize>;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}
