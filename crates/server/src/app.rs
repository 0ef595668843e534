//! Request routing, independent of the HTTP transport.

use crate::api::{SearchRequest, ValidateResponse, ValidationRequest};
use crate::error::ApiError;
use crate::feedback::FeedbackAssembler;
use crate::retrieval::RetrievalFilter;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Instant;

/// Status code and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` for bodiless responses (CORS preflight)
    pub body: Option<Value>,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: Some(json!({ "error": message })),
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        Self {
            status: err.status(),
            body: Some(err.body()),
        }
    }
}

/// The coaching API: `POST /search` and `POST /validate`.
pub struct App {
    retrieval: RetrievalFilter,
    feedback: FeedbackAssembler,
}

impl App {
    pub fn new(retrieval: RetrievalFilter, feedback: FeedbackAssembler) -> Self {
        Self {
            retrieval,
            feedback,
        }
    }

    /// Route one request. Never fails: every error becomes a response.
    pub async fn dispatch(&self, method: &str, path: &str, body: &[u8]) -> ApiResponse {
        let start = Instant::now();
        let route = path.split('?').next().unwrap_or(path);

        let response = match (method, route) {
            ("OPTIONS", _) => ApiResponse::no_content(),
            ("POST", "/search") => self.search(body).await,
            ("POST", "/validate") => self.validate(body).await,
            (_, "/search") | (_, "/validate") => ApiResponse::error(405, "Method not allowed"),
            _ => ApiResponse::error(404, "Not found"),
        };

        tracing::info!(
            method,
            path = route,
            status = response.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Handled request"
        );
        response
    }

    async fn search(&self, body: &[u8]) -> ApiResponse {
        let request: SearchRequest = match parse_body(body) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };
        let topic = request.query.unwrap_or_default();

        match self.retrieval.search(&topic).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(body) => ApiResponse::ok(body),
                Err(e) => ApiError::Internal(e.to_string()).into(),
            },
            Err(err) => {
                if err.status() >= 500 {
                    tracing::error!(topic = %topic, error = %err, "Search failed");
                }
                err.into()
            }
        }
    }

    async fn validate(&self, body: &[u8]) -> ApiResponse {
        let request: ValidationRequest = match parse_body(body) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        match self.feedback.feedback(request).await {
            Ok(feedback) => match serde_json::to_value(ValidateResponse { feedback }) {
                Ok(body) => ApiResponse::ok(body),
                Err(e) => ApiError::Internal(e.to_string()).into(),
            },
            Err(err) => {
                if err.status() >= 500 {
                    tracing::error!(error = ?err, "Validation failed");
                }
                err.into()
            }
        }
    }
}

/// Decode a JSON body. An empty body decodes as `{}` so missing fields are
/// reported by the handlers with their own messages.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}
