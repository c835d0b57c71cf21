//! Embedding engine for passages and queries.
//!
//! One embedder instance is created per pipeline and shared by the chunker,
//! the ingestion path and the retriever.

pub mod provider;
pub mod providers;

pub use provider::{create_embedder, Embedder};

use crate::types::Passage;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Shared embedding service wrapping a single loaded embedder.
#[derive(Debug, Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// The underlying embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Embed texts, one vector per input in input order.
    ///
    /// `requested_model` is accepted for API compatibility only; every request
    /// is served by the loaded embedder.
    pub async fn embed_texts(
        &self,
        texts: &[String],
        requested_model: Option<&str>,
    ) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(requested) = requested_model {
            if requested != self.embedder.model_name() {
                tracing::debug!(
                    "Requested model '{}' served by loaded model '{}'",
                    requested,
                    self.embedder.model_name()
                );
            }
        }

        let embeddings = self.embedder.embed_batch(texts).await?;

        if embeddings.len() != texts.len() {
            return Err(AppError::Computation(format!(
                "Embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {} with {}",
            embeddings.len(),
            self.embedder.dimensions(),
            self.embedder.model_name()
        );

        Ok(embeddings)
    }

    /// Embed passages, preserving passage order.
    pub async fn embed_passages(
        &self,
        passages: &[Passage],
        requested_model: Option<&str>,
    ) -> AppResult<Vec<Vec<f32>>> {
        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        self.embed_texts(&texts, requested_model).await
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        self.embedder.embed(query).await
    }
}
