//! Document ingestion: chunk, embed and index one document per run.
//!
//! Each run writes to a fresh collection named after the document, the
//! current time and a random run suffix, so re-processing a document never
//! mixes with older runs.

use crate::chunk::{describe, ChunkConfig, ChunkMethod, ChunkSummary, Chunker};
use crate::embeddings::{create_embedder, EmbeddingService};
use crate::extract::{extract_text, validate_upload};
use crate::rag::Retriever;
use crate::types::{Payload, VectorId};
use crate::vector_index::{create_index, VectorIndex};
use chrono::Utc;
use docqa_core::config::UploadSettings;
use docqa_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A stored passage, as the persistence layer would record it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk_index: u32,
    pub content: String,
    /// Length in characters
    pub chunk_size: usize,
    pub vector_id: VectorId,
}

/// Outcome of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub collection_id: String,
    pub chunking_method: ChunkMethod,
    pub embedding_model: String,
    pub chunk_count: usize,
    pub chunks: Vec<StoredChunk>,
    pub summaries: Vec<ChunkSummary>,
    pub processing_time_secs: f64,
    pub embedding_time_secs: f64,
}

/// Composes the chunker, the embedding service and the vector index.
///
/// All three share one embedder instance.
#[derive(Clone)]
pub struct DocumentProcessor {
    chunker: Chunker,
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    upload: UploadSettings,
}

impl DocumentProcessor {
    pub fn new(
        chunker: Chunker,
        embeddings: EmbeddingService,
        index: Arc<dyn VectorIndex>,
        upload: UploadSettings,
    ) -> Self {
        Self {
            chunker,
            embeddings,
            index,
            upload,
        }
    }

    /// Build the pipeline described by the configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let index = create_index(&config.vector_store.backend, embedder.dimensions())?;
        let chunker = Chunker::new(ChunkConfig::from(&config.chunking), Arc::clone(&embedder))?;

        tracing::debug!(
            "Pipeline ready: embedder '{}' ({} dims), index backend '{}'",
            embedder.model_name(),
            embedder.dimensions(),
            index.backend_name()
        );

        Ok(Self::new(
            chunker,
            EmbeddingService::new(embedder),
            index,
            config.upload.clone(),
        ))
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn index(&self) -> Arc<dyn VectorIndex> {
        Arc::clone(&self.index)
    }

    /// A retriever sharing this pipeline's embedder and index.
    pub fn retriever(&self, top_k: usize) -> Retriever {
        Retriever::new(self.embeddings.clone(), Arc::clone(&self.index), top_k)
    }

    /// Chunk, embed and index already extracted text.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn process_text(
        &self,
        document_id: &str,
        text: &str,
        method: ChunkMethod,
        embedding_model: Option<&str>,
    ) -> AppResult<IngestReport> {
        let start = Instant::now();

        let passages = self.chunker.chunk(text, method).await?;
        if passages.is_empty() {
            return Err(AppError::InvalidArgument(format!(
                "Document '{}' contains no text to index",
                document_id
            )));
        }

        let embedding_start = Instant::now();
        let vectors = self
            .embeddings
            .embed_passages(&passages, embedding_model)
            .await?;
        let embedding_time = embedding_start.elapsed();

        let collection_id = collection_id_for(document_id);
        let summaries = describe(&passages);
        let model = embedding_model
            .unwrap_or_else(|| self.embeddings.model_name())
            .to_string();

        self.index.create_collection(&collection_id).await?;

        let entries: Vec<(Vec<f32>, Payload)> = passages
            .iter()
            .zip(vectors)
            .map(|(passage, vector)| {
                let payload = Payload::new(passage.index, passage.content.clone())
                    .with("file_id", document_id)
                    .with("chunking_method", method.as_str())
                    .with("embedding_model", model.as_str());
                (vector, payload)
            })
            .collect();
        let vector_ids = match self.index.add_batch(&collection_id, entries).await {
            Ok(ids) => ids,
            Err(e) => {
                self.discard_collection(&collection_id).await;
                return Err(e);
            }
        };

        let chunks: Vec<StoredChunk> = passages
            .iter()
            .zip(vector_ids)
            .map(|(passage, vector_id)| StoredChunk {
                chunk_index: passage.index,
                content: passage.content.clone(),
                chunk_size: passage.char_count,
                vector_id,
            })
            .collect();

        let duration = start.elapsed();
        tracing::info!(
            "Processed document '{}' into '{}': {} chunks ({}) in {:.2}s",
            document_id,
            collection_id,
            chunks.len(),
            method,
            duration.as_secs_f64()
        );

        Ok(IngestReport {
            document_id: document_id.to_string(),
            collection_id,
            chunking_method: method,
            embedding_model: model,
            chunk_count: chunks.len(),
            chunks,
            summaries,
            processing_time_secs: duration.as_secs_f64(),
            embedding_time_secs: embedding_time.as_secs_f64(),
        })
    }

    /// Validate, extract and process a file.
    pub async fn process_file(
        &self,
        document_id: &str,
        path: &Path,
        method: ChunkMethod,
        embedding_model: Option<&str>,
    ) -> AppResult<IngestReport> {
        validate_upload(path, &self.upload)?;
        let text = extract_text(path)?;
        self.process_text(document_id, &text, method, embedding_model)
            .await
    }

    /// Best-effort removal of a collection left behind by a failed run.
    async fn discard_collection(&self, collection_id: &str) {
        if let Err(e) = self.index.delete_collection(collection_id).await {
            tracing::warn!(
                "Failed to clean up collection '{}' after ingestion error: {}",
                collection_id,
                e
            );
        }
    }

    /// Remove every vector stored for a processed document.
    pub async fn delete_document(&self, collection_id: &str) -> AppResult<()> {
        self.index.delete_collection(collection_id).await?;
        tracing::info!("Deleted collection '{}'", collection_id);
        Ok(())
    }
}

/// `file_{document_id}_{unix_seconds}_{run}`, unique per processing run.
fn collection_id_for(document_id: &str) -> String {
    let run = Uuid::new_v4().simple().to_string();
    format!(
        "file_{}_{}_{}",
        document_id,
        Utc::now().timestamp(),
        &run[..8]
    )
}
