//! Delete command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::DocumentProcessor;

/// Delete an indexed document collection
#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// Collection id reported by `ingest`
    pub collection: String,
}

impl DeleteCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing delete command for '{}'", self.collection);

        let processor = DocumentProcessor::from_config(config)?;
        processor.delete_document(&self.collection).await?;

        println!("Deleted collection '{}'", self.collection);
        Ok(())
    }
}
