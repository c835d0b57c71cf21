//! Ask command handler.
//!
//! Answers a question from an indexed collection. With `--file` the document
//! is ingested first in the same process, which is required for the
//! in-memory backend.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use super::chunk_method;
use docqa_knowledge::{DocumentProcessor, RagAnswer};
use std::path::PathBuf;

/// Answer a question from an indexed document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Collection id reported by `ingest`
    #[arg(long, conflicts_with = "file")]
    pub collection: Option<String>,

    /// Ingest this document first and answer from it
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Chunking method used with --file [default: from config]
    #[arg(short, long)]
    pub method: Option<String>,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let processor = DocumentProcessor::from_config(config)?;

        let collection = match &self.file {
            Some(file) => {
                let method = chunk_method(self.method.as_deref(), config)?;
                let document_id = uuid::Uuid::new_v4().simple().to_string();
                let report = processor
                    .process_file(&document_id, file, method, None)
                    .await?;
                tracing::debug!(
                    "Ingested {:?} into '{}' ({} chunks)",
                    file,
                    report.collection_id,
                    report.chunk_count
                );
                Some(report.collection_id)
            }
            None => self.collection.clone(),
        };

        let top_k = self.top_k.unwrap_or(config.vector_store.top_k);
        let answer = processor
            .retriever(top_k)
            .answer(&self.question, collection.as_deref())
            .await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            print_answer(&answer);
        }

        Ok(())
    }
}

fn print_answer(answer: &RagAnswer) {
    println!("{}", answer.response_text);

    if !answer.sources.is_empty() {
        println!("\nSources:");
        for source in &answer.sources {
            let preview: String = source.payload.content.chars().take(80).collect();
            println!(
                "  [{}] ({:.3}) {}",
                source.payload.chunk_index, source.similarity_score, preview
            );
        }
    }
}
