//! Document chunking with interchangeable strategies.
//!
//! This module turns cleaned text into ordered passages:
//! - `recursive`: paragraph, sentence, word and character tiers with overlap
//! - `semantic`: groups sentences whose embeddings are similar
//! - `custom`: splits on structural markers (headings, numbered sections)
//!
//! Every strategy produces plain strings; the [`Chunker`] validates the
//! configuration, dispatches to the strategy and numbers the passages.

mod describe;
mod recursive;
mod semantic;
mod structural;

pub use describe::{describe, ChunkSummary};
pub use recursive::RecursiveSplitter;
pub use semantic::{SemanticSplitter, SEMANTIC_THRESHOLD};
pub use structural::StructuralSplitter;

use crate::embeddings::Embedder;
use crate::types::Passage;
use docqa_core::config::ChunkingSettings;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Chunking strategy selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMethod {
    Recursive,
    Semantic,
    Custom,
}

impl ChunkMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkMethod::Recursive => "recursive",
            ChunkMethod::Semantic => "semantic",
            ChunkMethod::Custom => "custom",
        }
    }
}

impl fmt::Display for ChunkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recursive" => Ok(ChunkMethod::Recursive),
            "semantic" => Ok(ChunkMethod::Semantic),
            "custom" => Ok(ChunkMethod::Custom),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown chunking method '{}' (expected recursive, semantic or custom)",
                other
            ))),
        }
    }
}

/// Size limits for a chunking run, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target upper bound for a passage
    pub max_size: usize,

    /// Characters carried from the end of one passage into the next
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            max_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
        }
    }
}

impl ChunkConfig {
    pub fn new(max_size: usize, overlap: usize) -> AppResult<Self> {
        let config = Self { max_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_size == 0 {
            return Err(AppError::InvalidArgument(
                "Chunk max_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.max_size {
            return Err(AppError::InvalidArgument(format!(
                "Chunk overlap ({}) must be smaller than max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }
}

/// Trait for chunking strategies.
#[async_trait::async_trait]
pub trait ChunkStrategy: Send + Sync {
    /// Strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Split text into ordered, non-empty passage strings.
    async fn split(&self, text: &str, config: &ChunkConfig) -> AppResult<Vec<String>>;
}

/// Splits documents into numbered passages.
///
/// Holds the shared embedder so the semantic strategy reuses the same
/// model instance as ingestion and retrieval.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
    embedder: Arc<dyn Embedder>,
}

impl Chunker {
    pub fn new(config: ChunkConfig, embedder: Arc<dyn Embedder>) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config, embedder })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk with the configured limits.
    pub async fn chunk(&self, text: &str, method: ChunkMethod) -> AppResult<Vec<Passage>> {
        self.chunk_with(text, method, &self.config).await
    }

    /// Chunk with explicit limits for this call.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn chunk_with(
        &self,
        text: &str,
        method: ChunkMethod,
        config: &ChunkConfig,
    ) -> AppResult<Vec<Passage>> {
        config.validate()?;

        if text.trim().is_empty() {
            tracing::debug!("Input is empty or whitespace, no passages");
            return Ok(Vec::new());
        }

        let strategy = self.strategy(method);
        let pieces = strategy.split(text, config).await?;

        let passages: Vec<Passage> = pieces
            .into_iter()
            .filter(|piece| !piece.trim().is_empty())
            .enumerate()
            .map(|(index, content)| Passage::new(index as u32, content))
            .collect();

        tracing::debug!(
            "{} strategy produced {} passages from {} chars",
            strategy.name(),
            passages.len(),
            text.chars().count()
        );

        Ok(passages)
    }

    /// Dispatch to the appropriate strategy.
    fn strategy(&self, method: ChunkMethod) -> Box<dyn ChunkStrategy> {
        match method {
            ChunkMethod::Recursive => Box::new(RecursiveSplitter),
            ChunkMethod::Semantic => Box::new(SemanticSplitter::new(Arc::clone(&self.embedder))),
            ChunkMethod::Custom => Box::new(StructuralSplitter),
        }
    }
}

/// Length in characters.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
