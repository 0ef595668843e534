//! Error types for CCNA Coach.
//!
//! This module defines a unified error enum that covers every error category
//! below the HTTP layer: configuration, I/O, the question store, the semantic
//! index, embeddings, the language model and prompt rendering.

use thiserror::Error;

/// Unified error type for CCNA Coach.
///
/// All library functions return `Result<T, AppError>`. The HTTP layer
/// translates these into its own status-coded taxonomy.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model provider errors (non-success status, bad payload, transport)
    #[error("LLM error: {0}")]
    Llm(String),

    /// The language model provider refused the request with a rate limit
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Question store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Semantic index errors
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A downstream call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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
