//! Configuration management for DocQA.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.docqa/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit JSON log lines
    pub json_logs: bool,

    pub chunking: ChunkingSettings,

    pub embedding: EmbeddingSettings,

    pub vector_store: VectorStoreSettings,

    pub upload: UploadSettings,
}

/// Passage splitting parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum passage size in characters
    pub chunk_size: usize,

    /// Characters carried over from one passage into the next
    pub chunk_overlap: usize,

    /// Strategy used when the caller does not pick one
    pub default_method: String,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            default_method: "recursive".to_string(),
        }
    }
}

/// Embedding model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider: "hashing" (offline) or "ollama"
    pub provider: String,

    /// Model name reported in payloads and used by remote providers
    pub model: String,

    /// Vector dimension
    pub dimensions: usize,

    /// Base URL for remote providers
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "hashing".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Which vector index implementation to construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VectorBackend {
    /// In-process brute-force index (not durable)
    #[default]
    Memory,
    /// Qdrant server reached over its REST API
    Qdrant { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub backend: VectorBackend,

    /// Number of passages retrieved per question
    pub top_k: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            top_k: 5,
        }
    }
}

/// Limits applied to files before ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Accepted extensions, lowercase with leading dot
    pub allowed_extensions: Vec<String>,

    /// Maximum accepted file size in bytes
    pub max_file_size: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![".txt".to_string(), ".md".to_string()],
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    chunking: Option<ChunkingSettings>,
    embedding: Option<EmbeddingSettings>,
    vector_store: Option<VectorStoreSettings>,
    upload: Option<UploadSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
            chunking: ChunkingSettings::default(),
            embedding: EmbeddingSettings::default(),
            vector_store: VectorStoreSettings::default(),
            upload: UploadSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment variables.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_CHUNK_SIZE`, `DOCQA_CHUNK_OVERLAP`: Chunking parameters
    /// - `DOCQA_CHUNK_METHOD`: Default chunking method
    /// - `DOCQA_EMBEDDING_PROVIDER`, `DOCQA_EMBEDDING_MODEL`: Embedding selection
    /// - `DOCQA_QDRANT_URL`: Use the Qdrant backend at this URL
    /// - `DOCQA_TOP_K`: Passages retrieved per question
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.docqa_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        config.apply_env(|name| std::env::var(name).ok())?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `DOCQA_*`, `RUST_LOG` and `NO_COLOR` values from `var`.
    /// Unset variables leave the current value alone.
    fn apply_env<F>(&mut self, var: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = parse_usize("DOCQA_CHUNK_SIZE", var("DOCQA_CHUNK_SIZE"))? {
            self.chunking.chunk_size = size;
        }
        if let Some(overlap) = parse_usize("DOCQA_CHUNK_OVERLAP", var("DOCQA_CHUNK_OVERLAP"))? {
            self.chunking.chunk_overlap = overlap;
        }
        if let Some(method) = var("DOCQA_CHUNK_METHOD") {
            self.chunking.default_method = method;
        }
        if let Some(provider) = var("DOCQA_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = var("DOCQA_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(url) = var("DOCQA_QDRANT_URL") {
            self.vector_store.backend = VectorBackend::Qdrant { url };
        }
        if let Some(top_k) = parse_usize("DOCQA_TOP_K", var("DOCQA_TOP_K"))? {
            self.vector_store.top_k = top_k;
        }

        if let Some(level) = var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if var("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(vector_store) = config_file.vector_store {
            result.vector_store = vector_store;
        }
        if let Some(upload) = config_file.upload {
            result.upload = upload;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.json_logs = json;
            }
        }

        tracing::debug!("Merged configuration from {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        json_logs: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if json_logs {
            self.json_logs = true;
        }

        self
    }

    /// Get the path to the .docqa directory.
    pub fn docqa_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Validate numeric settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunking.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }

        if self.vector_store.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }

        let known_methods = ["recursive", "semantic", "custom"];
        if !known_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(self.chunking.default_method.trim()))
        {
            return Err(AppError::Config(format!(
                "Unknown chunking method: {}. Supported: {}",
                self.chunking.default_method,
                known_methods.join(", ")
            )));
        }

        let known_providers = ["hashing", "ollama"];
        if !known_providers.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_providers.join(", ")
            )));
        }

        Ok(())
    }
}

fn parse_usize(name: &str, value: Option<String>) -> AppResult<Option<usize>> {
    match value {
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.vector_store.backend, VectorBackend::Memory);
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.allowed_extensions, vec![".txt", ".md"]);
        assert_eq!(config.chunking.default_method, "recursive");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_docqa_dir() {
        let config = AppConfig::default();
        assert!(config.docqa_dir().ends_with(".docqa"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(None, None, None, true, true, false);

        assert!(overridden.verbose);
        assert!(overridden.no_color);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "chunking:\n  chunk_size: 500\nvector_store:\n  backend:\n    kind: qdrant\n    url: http://localhost:6333\nlogging:\n  json: true"
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(file.path()).unwrap();

        assert_eq!(merged.chunking.chunk_size, 500);
        // Unspecified fields keep their defaults
        assert_eq!(merged.chunking.chunk_overlap, 200);
        assert_eq!(merged.vector_store.top_k, 5);
        assert_eq!(
            merged.vector_store.backend,
            VectorBackend::Qdrant {
                url: "http://localhost:6333".to_string()
            }
        );
        assert!(merged.json_logs);
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunking: [1, 2").unwrap();

        let result = AppConfig::default().merge_yaml(file.path());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_overlap_not_smaller_than_size() {
        let mut config = AppConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_keeps_yaml_log_level_when_unset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: warn").unwrap();
        let mut config = AppConfig::default().merge_yaml(file.path()).unwrap();

        config.apply_env(|_| None).unwrap();
        assert_eq!(config.log_level, Some("warn".to_string()));

        config
            .apply_env(|name| (name == "RUST_LOG").then(|| "trace".to_string()))
            .unwrap();
        assert_eq!(config.log_level, Some("trace".to_string()));
    }

    #[test]
    fn test_env_overrides_settings() {
        let mut config = AppConfig::default();
        config
            .apply_env(|name| match name {
                "DOCQA_CHUNK_SIZE" => Some(" 600 ".to_string()),
                "DOCQA_CHUNK_METHOD" => Some("semantic".to_string()),
                "DOCQA_QDRANT_URL" => Some("http://qdrant:6333".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.chunking.chunk_size, 600);
        assert_eq!(config.chunking.default_method, "semantic");
        assert_eq!(
            config.vector_store.backend,
            VectorBackend::Qdrant {
                url: "http://qdrant:6333".to_string()
            }
        );
        assert!(!config.no_color);

        let invalid = AppConfig::default()
            .apply_env(|name| (name == "DOCQA_TOP_K").then(|| "many".to_string()));
        assert!(matches!(invalid, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_default_method() {
        let mut config = AppConfig::default();
        config.chunking.default_method = "Custom".to_string();
        assert!(config.validate().is_ok());

        config.chunking.default_method = "fractal".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }
}
