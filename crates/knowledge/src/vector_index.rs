//! Vector index abstraction for passage vectors.
//!
//! Defines a trait for backend-agnostic storage and nearest-neighbor search,
//! keyed by collection. The backend is chosen once from configuration.

use crate::memory_index::InMemoryIndex;
use crate::qdrant_index::QdrantIndex;
use crate::types::{Payload, SearchResult, VectorId};
use docqa_core::config::VectorBackend;
use docqa_core::AppResult;
use std::sync::Arc;

/// Guards the cosine denominator against zero vectors.
pub const COSINE_EPSILON: f32 = 1e-8;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Idempotent collection creation
/// - Adding vectors, overwriting an existing `chunk_index` in the same collection
/// - Deleting a whole collection (no-op when absent)
/// - Top-k search ordered by descending similarity (empty when absent)
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &str;

    /// Create the collection if it does not exist yet.
    async fn create_collection(&self, collection_id: &str) -> AppResult<()>;

    /// Store a vector with its payload, creating the collection if needed.
    async fn add(
        &self,
        collection_id: &str,
        vector: Vec<f32>,
        payload: Payload,
    ) -> AppResult<VectorId>;

    /// Store several vectors. Backends with bulk APIs override this.
    async fn add_batch(
        &self,
        collection_id: &str,
        entries: Vec<(Vec<f32>, Payload)>,
    ) -> AppResult<Vec<VectorId>> {
        let mut ids = Vec::with_capacity(entries.len());
        for (vector, payload) in entries {
            ids.push(self.add(collection_id, vector, payload).await?);
        }
        Ok(ids)
    }

    /// Remove the collection and everything in it.
    async fn delete_collection(&self, collection_id: &str) -> AppResult<()>;

    /// Return at most `top_k` results ordered by descending similarity.
    async fn search(
        &self,
        collection_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<SearchResult>>;

    /// Number of entries stored in the collection (0 when absent).
    async fn count(&self, collection_id: &str) -> AppResult<usize>;
}

/// Construct the configured backend.
pub fn create_index(backend: &VectorBackend, dimensions: usize) -> AppResult<Arc<dyn VectorIndex>> {
    match backend {
        VectorBackend::Memory => Ok(Arc::new(InMemoryIndex::new())),
        VectorBackend::Qdrant { url } => Ok(Arc::new(QdrantIndex::new(url, dimensions)?)),
    }
}

/// Cosine similarity: `dot(a, b) / (|a| * |b| + eps)`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + COSINE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.0, 0.0, 2.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_finite() {
        let score = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]);
        assert_eq!(score, 0.0);
        assert!(score.is_finite());
    }

    #[test]
    fn test_create_memory_index() {
        let index = create_index(&VectorBackend::Memory, 384).unwrap();
        assert_eq!(index.backend_name(), "memory");
    }

    #[test]
    fn test_create_qdrant_index() {
        let backend = VectorBackend::Qdrant {
            url: "http://localhost:6333".to_string(),
        };
        let index = create_index(&backend, 384).unwrap();
        assert_eq!(index.backend_name(), "qdrant");
    }
}
