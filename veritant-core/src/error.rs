//! Error types for the Veritant engine core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering configuration, the embedding collaborator, and serialization.
//!
//! Data-quality misses (an unparseable number, a claim without a period)
//! are not errors: those are absorbed at the extraction site and logged.
//! Errors here indicate a deployment defect or a failed collaborator call.

use std::path::PathBuf;

/// Top-level error type for the Veritant core library.
#[derive(Debug, thiserror::Error)]
pub enum VeritantError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the configuration system.
///
/// These fail loudly and early: an unknown intent or a malformed threshold
/// table indicates a deployment defect, not a data-quality issue.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Unknown research intent: {name}")]
    UnknownIntent { name: String },

    #[error("Malformed threshold table: {message}")]
    MalformedThresholds { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the embedding/similarity collaborator.
///
/// These are recoverable at the clustering stage, which degrades to
/// keyword-overlap similarity rather than producing no clusters at all.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {message}")]
    Request { message: String },

    #[error("Embedding response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Embedding batch size mismatch: sent {sent} texts, received {received} vectors")]
    BatchMismatch { sent: usize, received: usize },

    #[error("No async runtime available for remote embedding call")]
    NoRuntime,
}

/// A type alias for results using the top-level `VeritantError`.
pub type Result<T> = std::result::Result<T, VeritantError>;
