//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

/// `POST /search` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// `POST /search` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Topic exactly as submitted
    pub query: String,
    pub results: Vec<AnsweredQuestion>,
}

/// A retrieved question ready to render as multiple choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    /// 1-based position in this response, not the stored question id
    pub id: usize,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    /// `correct_answer` plus `incorrect_answers`, shuffled
    pub options: Vec<String>,
}

/// `POST /validate` body. Every field is required; they are optional here so
/// a missing one is reported as such rather than as a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answers: Option<Vec<String>>,
    #[serde(default)]
    pub user_answers: Option<Vec<String>>,
}

/// Outcome of a feedback request.
///
/// Language model failures are reported here, under a 200 status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackOutcome {
    Feedback { feedback: String },
    Error { error: String },
}

/// `POST /validate` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub feedback: FeedbackOutcome,
}
