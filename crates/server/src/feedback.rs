//! Feedback on a submitted practice test.
//!
//! A submission is validated first; only a well-formed batch reaches the
//! language model, and it does so in a single call.

use crate::api::{FeedbackOutcome, ValidationRequest};
use crate::error::ApiError;
use ccna_core::AppError;
use ccna_llm::{LlmClient, LlmRequest};
use ccna_prompt::{build_prompt, PromptDefinition};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// One graded item: question, its correct answer, and what the user chose.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackItem {
    pub question: String,
    pub correct_answer: String,
    pub user_answer: String,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackBatch {
    pub query: String,
    pub items: Vec<FeedbackItem>,
}

/// How a language model call failed, as reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackFailure {
    RateLimited,
    UpstreamError,
    UnexpectedError,
}

impl FeedbackFailure {
    pub fn classify(err: &AppError) -> Self {
        match err {
            AppError::RateLimited(_) => Self::RateLimited,
            AppError::Llm(_) | AppError::Timeout(_) => Self::UpstreamError,
            _ => Self::UnexpectedError,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limit exceeded. Please try again later.",
            Self::UpstreamError => "An error occurred with the language model API.",
            Self::UnexpectedError => "An unexpected error occurred.",
        }
    }
}

/// Turns a validated submission into coaching feedback.
pub struct FeedbackAssembler {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    timeout: Duration,
}

impl FeedbackAssembler {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
            timeout,
        }
    }

    /// Check a submission's shape.
    ///
    /// Fields must all be present, the arrays non-empty and of equal length.
    pub fn validate(request: ValidationRequest) -> Result<FeedbackBatch, ApiError> {
        let (Some(query), Some(questions), Some(correct_answers), Some(user_answers)) = (
            request.query,
            request.questions,
            request.correct_answers,
            request.user_answers,
        ) else {
            return Err(ApiError::MissingFields);
        };

        if questions.is_empty() || correct_answers.is_empty() || user_answers.is_empty() {
            return Err(ApiError::InvalidInput("Invalid input data.".to_string()));
        }

        if questions.len() != correct_answers.len() || questions.len() != user_answers.len() {
            return Err(ApiError::InvalidInput(
                "Mismatch in the length of questions, correct_answers, and user_answers."
                    .to_string(),
            ));
        }

        let items = questions
            .into_iter()
            .zip(correct_answers)
            .zip(user_answers)
            .map(|((question, correct_answer), user_answer)| FeedbackItem {
                question,
                correct_answer,
                user_answer,
            })
            .collect();

        Ok(FeedbackBatch { query, items })
    }

    /// Ask the language model for feedback on the whole batch.
    ///
    /// Model failures become an error outcome rather than an `Err`; only a
    /// prompt that fails to render is a server error.
    pub async fn assemble(&self, batch: &FeedbackBatch) -> Result<FeedbackOutcome, ApiError> {
        let context = json!({
            "query": batch.query,
            "items": batch
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| json!({
                    "number": i + 1,
                    "question": item.question,
                    "correct_answer": item.correct_answer,
                    "user_answer": item.user_answer,
                }))
                .collect::<Vec<_>>(),
        });

        let prompt = build_prompt(&self.prompt, &context)?;

        let mut request = LlmRequest::new(prompt.user, self.model.clone());
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.prompt.behavior.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.prompt.behavior.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            provider = self.client.provider_name(),
            model = %self.model,
            items = batch.items.len(),
            "Requesting feedback"
        );

        let result = match tokio::time::timeout(self.timeout, self.client.complete(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "language model did not answer within {}s",
                self.timeout.as_secs()
            ))),
        };

        Ok(match result {
            Ok(response) => FeedbackOutcome::Feedback {
                feedback: response.content.trim().to_string(),
            },
            Err(err) => {
                let failure = FeedbackFailure::classify(&err);
                tracing::error!(error = %err, ?failure, "Feedback generation failed");
                FeedbackOutcome::Error {
                    error: failure.message().to_string(),
                }
            }
        })
    }

    /// Validate, then assemble.
    pub async fn feedback(&self, request: ValidationRequest) -> Result<FeedbackOutcome, ApiError> {
        let batch = Self::validate(request)?;
        self.assemble(&batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubLlm;
    use ccna_prompt::load_prompt;

    fn assembler(llm: StubLlm) -> FeedbackAssembler {
        let prompt = load_prompt(std::path::Path::new("/nonexistent"), "coach.feedback").unwrap();
        FeedbackAssembler::new(Arc::new(llm), prompt, "gpt-4", Duration::from_secs(5))
    }

    fn request(questions: &[&str], correct: &[&str], user: &[&str]) -> ValidationRequest {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ValidationRequest {
            query: Some("OSPF".to_string()),
            questions: Some(owned(questions)),
            correct_answers: Some(owned(correct)),
            user_answers: Some(owned(user)),
        }
    }

    #[test]
    fn test_missing_field_is_reported() {
        let mut req = request(&["Q"], &["A"], &["A"]);
        req.user_answers = None;
        assert!(matches!(
            FeedbackAssembler::validate(req),
            Err(ApiError::MissingFields)
        ));
    }

    #[test]
    fn test_empty_arrays_are_invalid() {
        let err = FeedbackAssembler::validate(request(&[], &[], &[])).unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(err.to_string(), "Invalid input data.");
    }

    #[tokio::test]
    async fn test_length_mismatch_never_calls_the_model() {
        let llm = StubLlm::replying("unused");
        let calls = llm.calls();
        let assembler = assembler(llm);

        let err = assembler
            .feedback(request(&["Q1", "Q2"], &["A1", "A2"], &["A1"]))
            .await
            .unwrap_err();

        assert_eq!(err.status(), 400);
        assert_eq!(
            err.to_string(),
            "Mismatch in the length of questions, correct_answers, and user_answers."
        );
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_lists_every_item_in_order() {
        let llm = StubLlm::replying("  Good work on OSPF.\n");
        let last = llm.last_request();
        let assembler = assembler(llm);

        let outcome = assembler
            .feedback(request(
                &["What does OSPF stand for?", "What is the OSPF metric?"],
                &["Open Shortest Path First", "Cost"],
                &["Open Shortest Path First", "Hop count"],
            ))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FeedbackOutcome::Feedback {
                feedback: "Good work on OSPF.".to_string()
            }
        );

        let sent = last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.system.as_deref(), Some("You are a CCNA exam coach."));
        assert_eq!(sent.model, "gpt-4");
        assert_eq!(sent.temperature, Some(0.3));
        assert!(sent.prompt.contains(r#"here is my query: "OSPF""#));
        let first = sent.prompt.find("Question 1: What does OSPF stand for?").unwrap();
        let second = sent.prompt.find("Question 2: What is the OSPF metric?").unwrap();
        assert!(first < second);
        assert!(sent.prompt.contains("My Answer: Hop count"));
    }

    #[tokio::test]
    async fn test_rate_limit_becomes_error_outcome() {
        let assembler = assembler(StubLlm::failing(|| {
            AppError::RateLimited("429 Too Many Requests".to_string())
        }));

        let outcome = assembler
            .feedback(request(&["Q"], &["A"], &["B"]))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FeedbackOutcome::Error {
                error: "Rate limit exceeded. Please try again later.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_error_outcome() {
        let assembler = assembler(StubLlm::failing(|| {
            AppError::Llm("500 Internal Server Error".to_string())
        }));

        let outcome = assembler
            .feedback(request(&["Q"], &["A"], &["B"]))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FeedbackOutcome::Error {
                error: "An error occurred with the language model API.".to_string()
            }
        );
    }

    #[test]
    fn test_classify_failures() {
        assert_eq!(
            FeedbackFailure::classify(&AppError::Timeout("30s".into())),
            FeedbackFailure::UpstreamError
        );
        assert_eq!(
            FeedbackFailure::classify(&AppError::Other("boom".into())),
            FeedbackFailure::UnexpectedError
        );
        assert_eq!(
            FeedbackFailure::UnexpectedError.message(),
            "An unexpected error occurred."
        );
    }
}
