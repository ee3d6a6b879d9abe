//! Error types for the course notes service.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! corpus loading, index persistence and the two external model providers.
//! The variants mirror the failure kinds the query pipeline has to tell
//! apart: only [`AppError::IndexLoadFailed`] is recoverable (by rebuilding),
//! everything else is propagated to the caller.

use thiserror::Error;

/// Unified error type for the course notes service.
///
/// All functions in the workspace return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus directory missing, unreadable or empty when a build is required
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// Persisted index is missing, malformed or incompatible
    #[error("Index load failed: {0}")]
    IndexLoadFailed(String),

    /// Writing the index to storage failed
    #[error("Index persist failed: {0}")]
    PersistFailed(String),

    /// Embedding provider unreachable or returned an unusable vector
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// Generative provider unreachable or returned an error
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Caller supplied an unusable value (e.g. an empty question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error only means "the persisted index is unusable".
    ///
    /// The index manager rebuilds from the corpus for these and propagates
    /// every other error unchanged.
    pub fn is_recoverable_by_rebuild(&self) -> bool {
        matches!(self, AppError::IndexLoadFailed(_))
    }

    /// Short machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::CorpusUnavailable(_) => "CORPUS_UNAVAILABLE",
            AppError::IndexLoadFailed(_) => "INDEX_LOAD_FAILED",
            AppError::PersistFailed(_) => "PERSIST_FAILED",
            AppError::EmbeddingFailed(_) => "EMBEDDING_FAILED",
            AppError::GenerationUnavailable(_) => "GENERATION_UNAVAILABLE",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Other(_) => "INTERNAL_ERROR",
        }
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

impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_index_load_failure_is_recoverable() {
        assert!(AppError::IndexLoadFailed("corrupt".into()).is_recoverable_by_rebuild());
        assert!(!AppError::CorpusUnavailable("empty".into()).is_recoverable_by_rebuild());
        assert!(!AppError::PersistFailed("disk full".into()).is_recoverable_by_rebuild());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!AppError::from(io).is_recoverable_by_rebuild());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::GenerationUnavailable("down".into()).code(),
            "GENERATION_UNAVAILABLE"
        );
        assert_eq!(AppError::InvalidInput("empty".into()).code(), "INVALID_INPUT");
    }

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::EmbeddingFailed("timeout".into());
        assert_eq!(err.to_string(), "Embedding failed: timeout");
    }
}
