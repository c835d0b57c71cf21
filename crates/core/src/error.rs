//! Error types for DocQA.
//!
//! A single error enum covers the ingestion and retrieval taxonomy
//! (invalid input, unavailable backend, missing data, failed computation)
//! plus the ambient configuration, I/O and serialization failures.

use thiserror::Error;

/// Unified error type for DocQA.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown chunking method, unsupported file type, bad parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The vector backend cannot be reached or rejected an operation
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A collection or document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Embedding or similarity computation failed
    #[error("Computation error: {0}")]
    Computation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`AppError`].
///
/// Callers that need to react differently to missing data and to real
/// failures match on this instead of inspecting error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    BackendUnavailable,
    NotFound,
    Computation,
    Config,
    Io,
    Serialization,
    Other,
}

impl AppError {
    /// Structured kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Computation(_) => ErrorKind::Computation,
            AppError::Config(_) => ErrorKind::Config,
            AppError::Io(_) => ErrorKind::Io,
            AppError::Serialization(_) => ErrorKind::Serialization,
            AppError::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether this error means "the data is not there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
