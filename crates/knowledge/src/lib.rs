//! Document question answering.
//!
//! Splits documents into passages, embeds them, stores the vectors in a
//! collection-keyed index and answers questions from the best matches.
//!
//! ```text
//! text -> Chunker -> passages -> EmbeddingService -> VectorIndex
//! question -> EmbeddingService -> VectorIndex::search -> Retriever -> RagAnswer
//! ```

pub mod chunk;
pub mod embeddings;
pub mod extract;
pub mod ingest;
pub mod memory_index;
pub mod qdrant_index;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunk::{describe, ChunkConfig, ChunkMethod, ChunkSummary, Chunker};
pub use embeddings::{create_embedder, Embedder, EmbeddingService};
pub use extract::{clean_text, extract_text, is_extractable, validate_upload, SUPPORTED_EXTENSIONS};
pub use ingest::{DocumentProcessor, IngestReport, StoredChunk};
pub use memory_index::InMemoryIndex;
pub use qdrant_index::QdrantIndex;
pub use rag::{RagAnswer, Retriever};
pub use types::{Passage, Payload, SearchResult, VectorId};
pub use vector_index::{cosine_similarity, create_index, VectorIndex};
