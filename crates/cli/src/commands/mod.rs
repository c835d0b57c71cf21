//! Command handlers for the DocQA CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chunk;
pub mod delete;
pub mod ingest;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chunk::ChunkCommand;
pub use delete::DeleteCommand;
pub use ingest::IngestCommand;

use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::ChunkMethod;

/// The method named on the command line, else the configured default.
pub fn chunk_method(requested: Option<&str>, config: &AppConfig) -> AppResult<ChunkMethod> {
    requested
        .unwrap_or(&config.chunking.default_method)
        .parse()
}
