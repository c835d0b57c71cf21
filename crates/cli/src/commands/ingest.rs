//! Ingest command handler.
//!
//! Processes files and directories into vector collections.

use clap::Args;
use docqa_core::config::UploadSettings;
use docqa_core::{config::AppConfig, AppResult};
use super::chunk_method;
use docqa_knowledge::{is_extractable, DocumentProcessor, IngestReport};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Chunk, embed and index documents
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Chunking method (recursive, semantic, custom) [default: from config]
    #[arg(short, long)]
    pub method: Option<String>,

    /// Embedding model to record with each passage
    #[arg(long)]
    pub model: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {} paths", self.paths.len());

        let method = chunk_method(self.method.as_deref(), config)?;
        let processor = DocumentProcessor::from_config(config)?;
        let files = collect_files(&self.paths, &config.upload);

        let mut reports = Vec::new();
        let mut failures = Vec::new();

        for file in &files {
            let document_id = uuid::Uuid::new_v4().simple().to_string();
            match processor
                .process_file(&document_id, file, method, self.model.as_deref())
                .await
            {
                Ok(report) => reports.push((file.clone(), report)),
                Err(e) => {
                    tracing::warn!("Failed to process {:?}: {}", file, e);
                    failures.push((file.clone(), e.to_string()));
                }
            }
        }

        if self.json {
            let output = serde_json::json!({
                "reports": reports.iter().map(|(file, report)| serde_json::json!({
                    "file": file,
                    "report": report,
                })).collect::<Vec<_>>(),
                "failures": failures.iter().map(|(file, error)| serde_json::json!({
                    "file": file,
                    "error": error,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for (file, report) in &reports {
                print_report(file, report);
            }
            for (file, error) in &failures {
                println!("Failed {}: {}", file.display(), error);
            }
            println!(
                "\nIngested {} of {} files",
                reports.len(),
                files.len()
            );
        }

        Ok(())
    }
}

fn print_report(file: &Path, report: &IngestReport) {
    println!(
        "{} -> {} ({} chunks, {} in {:.2}s, embedding {:.2}s)",
        file.display(),
        report.collection_id,
        report.chunk_count,
        report.chunking_method,
        report.processing_time_secs,
        report.embedding_time_secs
    );
}

/// Expand directories into the files with an allowed extension that can
/// also be extracted.
/// Explicitly named files are kept as given so validation can report them.
fn collect_files(paths: &[PathBuf], upload: &UploadSettings) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file()
                    && has_allowed_extension(entry_path, upload)
                    && is_extractable(entry_path)
                {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files
}

fn has_allowed_extension(path: &Path, upload: &UploadSettings) -> bool {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let extension = format!(".{}", extension);
    upload
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
}
