//! Topic search: semantic candidates, a lexical relevance guard, answer
//! lookup and option shuffling.

use crate::api::{AnsweredQuestion, SearchResponse};
use crate::error::ApiError;
use ccna_knowledge::{QuestionStore, SemanticIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Correct answer reported for a candidate with no store row.
pub const MISSING_CORRECT_ANSWER: &str = "Correct Answer Not Found";

/// Distractors reported for a candidate with no store row.
pub const MISSING_INCORRECT_ANSWERS: [&str; 3] = ["Incorrect 1", "Incorrect 2", "Incorrect 3"];

/// Turns a topic into a batch of multiple-choice questions.
pub struct RetrievalFilter {
    index: Arc<dyn SemanticIndex>,
    store: Arc<dyn QuestionStore>,
    top_k: usize,
    timeout: Duration,
}

impl RetrievalFilter {
    pub fn new(
        index: Arc<dyn SemanticIndex>,
        store: Arc<dyn QuestionStore>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            index,
            store,
            top_k,
            timeout,
        }
    }

    /// Search for questions on `topic`.
    ///
    /// Options are reshuffled on every call.
    pub async fn search(&self, topic: &str) -> Result<SearchResponse, ApiError> {
        let candidates = self.candidates(topic).await?;
        let unshuffled = self.resolve_answers(&candidates)?;

        let mut rng = rand::rng();
        let results = unshuffled
            .into_iter()
            .enumerate()
            .map(|(i, (question, correct_answer, incorrect_answers))| {
                let options = build_options(&correct_answer, &incorrect_answers, &mut rng);
                AnsweredQuestion {
                    id: i + 1,
                    question,
                    correct_answer,
                    incorrect_answers,
                    options,
                }
            })
            .collect();

        Ok(SearchResponse {
            query: topic.to_string(),
            results,
        })
    }

    /// Candidate question texts for a topic, after the relevance guard.
    async fn candidates(&self, topic: &str) -> Result<Vec<String>, ApiError> {
        if topic.trim().is_empty() {
            return Err(ApiError::EmptyQuery);
        }

        let query = vec![topic.to_string()];
        let batch = tokio::time::timeout(self.timeout, self.index.query(&query, self.top_k))
            .await
            .map_err(|_| {
                ApiError::IndexFailure(format!(
                    "semantic index did not answer within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        // One query in, one result list out
        let candidates: Vec<String> = batch
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .take(self.top_k)
            .map(|hit| hit.document)
            .collect();

        tracing::debug!(topic, candidates = candidates.len(), "Semantic candidates");

        if candidates.is_empty() {
            return Err(ApiError::NoTopicMatch);
        }

        if !passes_relevance_guard(topic, &candidates) {
            tracing::info!(topic, "Topic shares no words with any candidate");
            return Err(ApiError::NotCcnaRelated);
        }

        Ok(candidates)
    }

    /// Look up answers for each candidate, in order.
    ///
    /// A missing row is filled with sentinel answers; a failing lookup aborts
    /// the whole batch.
    fn resolve_answers(
        &self,
        candidates: &[String],
    ) -> Result<Vec<(String, String, Vec<String>)>, ApiError> {
        candidates
            .iter()
            .map(|question| {
                let answers = self
                    .store
                    .find_answers(question)
                    .map_err(|e| ApiError::StoreLookupFailure(e.to_string()))?;

                Ok(match answers {
                    Some(set) => (question.clone(), set.correct_answer, set.incorrect_answers),
                    None => {
                        tracing::warn!(question = %question, "Indexed question missing from store");
                        (
                            question.clone(),
                            MISSING_CORRECT_ANSWER.to_string(),
                            MISSING_INCORRECT_ANSWERS
                                .iter()
                                .map(|s| s.to_string())
                                .collect(),
                        )
                    }
                })
            })
            .collect()
    }
}

/// Lowercased whitespace-delimited words.
fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// True if any candidate shares at least one whole word with the topic.
///
/// Punctuation stays attached to words, so "OSPF?" does not match "ospf".
pub fn passes_relevance_guard(topic: &str, candidates: &[String]) -> bool {
    let topic_words = word_set(topic);
    candidates
        .iter()
        .any(|candidate| !word_set(candidate).is_disjoint(&topic_words))
}

/// The correct answer and the distractors in a uniformly random order.
pub fn build_options<R: Rng + ?Sized>(
    correct_answer: &str,
    incorrect_answers: &[String],
    rng: &mut R,
) -> Vec<String> {
    let mut options = Vec::with_capacity(incorrect_answers.len() + 1);
    options.push(correct_answer.to_string());
    options.extend(incorrect_answers.iter().cloned());
    options.shuffle(rng);
    options
}
