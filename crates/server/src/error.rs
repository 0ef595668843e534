//! HTTP-facing error taxonomy.
//!
//! Every request failure maps to one variant, which fixes the status code and
//! the `{"error": ...}` message the client sees. Language model failures are
//! not here: they travel inside a successful feedback envelope.

use ccna_core::AppError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Topic missing or blank
    #[error("Query is required")]
    EmptyQuery,

    /// The semantic index returned no candidates
    #[error("No CCNA-related topics found. Try a different CCNA topic.")]
    NoTopicMatch,

    /// Candidates exist but none shares a word with the topic
    #[error("The topic should be related to CCNA. Please try again with a valid CCNA-related topic.")]
    NotCcnaRelated,

    /// A question store lookup failed; aborts the whole search
    #[error("Error retrieving answers: {0}")]
    StoreLookupFailure(String),

    /// The semantic index query failed or timed out
    #[error("Error searching questions: {0}")]
    IndexFailure(String),

    /// Validation arrays are empty or of unequal length
    #[error("{0}")]
    InvalidInput(String),

    /// A required validation field is absent
    #[error("Invalid input data. Ensure query, questions, correct_answers, and user_answers are provided.")]
    MissingFields,

    /// Request body is not the expected JSON shape
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::EmptyQuery
            | Self::NoTopicMatch
            | Self::NotCcnaRelated
            | Self::InvalidInput(_)
            | Self::MissingFields
            | Self::MalformedBody(_) => 400,
            Self::BodyTooLarge => 413,
            Self::StoreLookupFailure(_) | Self::IndexFailure(_) | Self::Internal(_) => 500,
        }
    }

    pub fn body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Store(msg) => Self::StoreLookupFailure(msg),
            AppError::Index(msg) | AppError::Embedding(msg) => Self::IndexFailure(msg),
            AppError::Timeout(msg) => Self::IndexFailure(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        for err in [
            ApiError::EmptyQuery,
            ApiError::NoTopicMatch,
            ApiError::NotCcnaRelated,
            ApiError::MissingFields,
            ApiError::InvalidInput("Invalid input data.".to_string()),
        ] {
            assert_eq!(err.status(), 400, "{}", err);
        }
    }

    #[test]
    fn test_store_failure_is_500_with_cause() {
        let err = ApiError::from(AppError::Store("database is locked".to_string()));
        assert_eq!(err.status(), 500);
        assert_eq!(
            err.body(),
            json!({"error": "Error retrieving answers: database is locked"})
        );
    }

    #[test]
    fn test_oversized_body_is_413() {
        let err = ApiError::BodyTooLarge;
        assert_eq!(err.status(), 413);
        assert_eq!(err.body(), json!({"error": "Request body too large"}));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ApiError::Internal("prompt render failed".to_string());
        assert_eq!(err.body(), json!({"error": "Internal server error"}));
    }
}
