//! Chunk command handler.
//!
//! Prints the passages a document would be split into, without indexing.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use super::chunk_method;
use docqa_knowledge::{create_embedder, describe, extract_text, ChunkConfig, Chunker};
use std::path::PathBuf;

/// Split a document into passages
#[derive(Args, Debug)]
pub struct ChunkCommand {
    /// Document to split (.txt or .md)
    pub file: PathBuf,

    /// Chunking method (recursive, semantic, custom) [default: from config]
    #[arg(short, long)]
    pub method: Option<String>,

    /// Maximum passage size in characters
    #[arg(long)]
    pub max_size: Option<usize>,

    /// Characters carried over between passages
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunkCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chunk command for {:?}", self.file);

        let method = chunk_method(self.method.as_deref(), config)?;
        let chunk_config = ChunkConfig::new(
            self.max_size.unwrap_or(config.chunking.chunk_size),
            self.overlap.unwrap_or(config.chunking.chunk_overlap),
        )?;

        let embedder = create_embedder(&config.embedding)?;
        let chunker = Chunker::new(chunk_config, embedder)?;

        let text = extract_text(&self.file)?;
        let passages = chunker.chunk(&text, method).await?;
        let summaries = describe(&passages);

        if self.json {
            let output = serde_json::json!({
                "file": self.file,
                "method": method,
                "passages": passages,
                "summaries": summaries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "{} passages ({} method, max {} chars, overlap {})",
                passages.len(),
                method,
                chunk_config.max_size,
                chunk_config.overlap
            );
            for summary in &summaries {
                println!(
                    "\n[{}] {} chars, {} words, keywords: {}",
                    summary.chunk_index,
                    summary.char_count,
                    summary.word_count,
                    summary.keywords.join(", ")
                );
                println!("    {}", summary.preview);
            }
        }

        Ok(())
    }
}
