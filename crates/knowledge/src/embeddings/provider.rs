//! Embedder trait and factory.

use docqa_core::config::EmbeddingSettings;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be pure with respect to their model: the same text
/// always yields the same vector, and output order matches input order.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "hashing", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Computation("No embedding returned".to_string()))
    }
}

/// Create an embedder based on configuration.
pub fn create_embedder(settings: &EmbeddingSettings) -> AppResult<Arc<dyn Embedder>> {
    match settings.provider.as_str() {
        "hashing" => Ok(Arc::new(super::providers::hashing::HashingEmbedder::new(
            settings.dimensions,
        ))),

        "ollama" => Ok(Arc::new(super::providers::ollama::OllamaEmbedder::new(
            settings,
        )?)),

        _ => Err(AppError::InvalidArgument(format!(
            "Unknown embedding provider: '{}'. Supported providers: hashing, ollama",
            settings.provider
        ))),
    }
}
