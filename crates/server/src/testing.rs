//! Test doubles shared by the server's unit tests.

use ccna_core::{AppError, AppResult};
use ccna_knowledge::{
    AnswerSet, QuestionStore, SearchHit, SeedQuestion, SemanticIndex, SqliteQuestionStore,
};
use ccna_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Store holding three known questions. "What does OSPF use as its metric?"
/// is deliberately absent.
pub fn seeded_store() -> SqliteQuestionStore {
    let store = SqliteQuestionStore::open_in_memory().unwrap();
    let seed = |q: &str, a: &str, wrong: [&str; 3]| SeedQuestion {
        question: q.to_string(),
        correct_answer: a.to_string(),
        incorrect_answers: wrong.iter().map(|s| s.to_string()).collect(),
    };
    store
        .insert_many(&[
            seed(
                "What does OSPF stand for?",
                "Open Shortest Path First",
                [
                    "Open Source Path Forwarding",
                    "Optimal Shortest Path First",
                    "Open Systems Protocol Function",
                ],
            ),
            seed(
                "What is the default administrative distance of OSPF?",
                "110",
                ["90", "120", "100"],
            ),
            seed(
                "Which port does SSH use by default?",
                "22",
                ["23", "21", "443"],
            ),
        ])
        .unwrap();
    store
}

/// Semantic index that returns its whole candidate list for any query,
/// whatever `top_k` asks for.
pub struct StubIndex {
    documents: Vec<String>,
    failure: Mutex<Option<AppError>>,
    calls: Arc<AtomicUsize>,
}

impl StubIndex {
    pub fn returning(documents: &[&str]) -> Self {
        Self {
            documents: documents.iter().map(|d| d.to_string()).collect(),
            failure: Mutex::new(None),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(err: AppError) -> Self {
        Self {
            documents: Vec::new(),
            failure: Mutex::new(Some(err)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl SemanticIndex for StubIndex {
    async fn upsert(&self, _records: &[(i64, String)]) -> AppResult<()> {
        Ok(())
    }

    async fn query(&self, queries: &[String], _top_k: usize) -> AppResult<Vec<Vec<SearchHit>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().unwrap().take() {
            return Err(err);
        }

        let hits: Vec<SearchHit> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| SearchHit {
                id: i as i64 + 1,
                document: doc.clone(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        Ok(queries.iter().map(|_| hits.clone()).collect())
    }

    fn count(&self) -> AppResult<usize> {
        Ok(self.documents.len())
    }

    fn reset(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Store whose every lookup fails.
pub struct FailingStore;

impl QuestionStore for FailingStore {
    fn find_answers(&self, _question: &str) -> AppResult<Option<AnswerSet>> {
        Err(AppError::Store("database is locked".to_string()))
    }

    fn question_texts(&self) -> AppResult<Vec<(i64, String)>> {
        Ok(Vec::new())
    }

    fn insert_many(&self, _questions: &[SeedQuestion]) -> AppResult<usize> {
        Ok(0)
    }

    fn count(&self) -> AppResult<usize> {
        Ok(0)
    }

    fn reset(&self) -> AppResult<()> {
        Ok(())
    }
}

type ErrorFactory = Box<dyn Fn() -> AppError + Send + Sync>;

/// Language model that replies with fixed text or fails, counting calls.
pub struct StubLlm {
    reply: Result<String, ErrorFactory>,
    calls: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<LlmRequest>>>,
}

impl StubLlm {
    pub fn replying(content: &str) -> Self {
        Self {
            reply: Ok(content.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing(err: impl Fn() -> AppError + Send + Sync + 'static) -> Self {
        Self {
            reply: Err(Box::new(err)),
            calls: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn last_request(&self) -> Arc<Mutex<Option<LlmRequest>>> {
        Arc::clone(&self.last)
    }
}

#[async_trait::async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());

        match &self.reply {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(100, 20),
            }),
            Err(make) => Err(make()),
        }
    }
}
