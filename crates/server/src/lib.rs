//! HTTP API for CCNA Coach.
//!
//! Two endpoints:
//! - `POST /search`: turn a topic into up to `top_k` multiple-choice questions
//! - `POST /validate`: grade submitted answers with the language model
//!
//! [`App`] holds the routing and is transport independent; [`http`] serves it
//! over a `tiny_http` worker pool.

pub mod api;
pub mod app;
pub mod error;
pub mod feedback;
pub mod http;
pub mod retrieval;

#[cfg(test)]
mod testing;

pub use api::{
    AnsweredQuestion, FeedbackOutcome, SearchRequest, SearchResponse, ValidateResponse,
    ValidationRequest,
};
pub use app::{ApiResponse, App};
pub use error::ApiError;
pub use feedback::{FeedbackAssembler, FeedbackBatch, FeedbackFailure, FeedbackItem};
pub use http::{serve, start, ServerHandle};
pub use retrieval::{RetrievalFilter, MISSING_CORRECT_ANSWER, MISSING_INCORRECT_ANSWERS};
