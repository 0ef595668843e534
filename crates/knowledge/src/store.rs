//! SQLite-backed question store.
//!
//! One `questions` table holds every practice question with its correct
//! answer and distractors. Distractors are stored as a JSON array.

use crate::types::{AnswerSet, SeedQuestion};
use ccna_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Read and write access to stored questions.
///
/// Lookups are by exact question text, which is how the semantic index
/// refers back to the store.
pub trait QuestionStore: Send + Sync {
    /// Answers for the first question whose text matches exactly.
    fn find_answers(&self, question: &str) -> AppResult<Option<AnswerSet>>;

    /// Every `(id, question)` pair, ordered by id.
    fn question_texts(&self) -> AppResult<Vec<(i64, String)>>;

    /// Insert questions in one transaction; returns how many were inserted.
    fn insert_many(&self, questions: &[SeedQuestion]) -> AppResult<usize>;

    /// Number of stored questions.
    fn count(&self) -> AppResult<usize>;

    /// Delete every question.
    fn reset(&self) -> AppResult<()>;
}

/// Question store on a single SQLite connection.
pub struct SqliteQuestionStore {
    conn: Mutex<Connection>,
}

impl SqliteQuestionStore {
    /// Open (or create) the store at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Store(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Store(format!("Failed to open question store: {}", e)))?;

        tracing::debug!("Opened question store at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// In-memory store, for tests and throwaway runs.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("Failed to open question store: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                correct_answer TEXT NOT NULL,
                incorrect_answers TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_questions_text ON questions(question);
            "#,
        )
        .map_err(|e| AppError::Store(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("Question store lock poisoned".to_string()))
    }
}

impl QuestionStore for SqliteQuestionStore {
    fn find_answers(&self, question: &str) -> AppResult<Option<AnswerSet>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT correct_answer, incorrect_answers FROM questions
                 WHERE question = ?1 ORDER BY id LIMIT 1",
                params![question],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| AppError::Store(format!("Failed to look up answers: {}", e)))?;

        Ok(row.map(|(correct_answer, incorrect)| AnswerSet {
            correct_answer,
            incorrect_answers: decode_answers(&incorrect),
        }))
    }

    fn question_texts(&self) -> AppResult<Vec<(i64, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, question FROM questions ORDER BY id")
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| AppError::Store(format!("Failed to query questions: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to read question row: {}", e)))
    }

    fn insert_many(&self, questions: &[SeedQuestion]) -> AppResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO questions (question, correct_answer, incorrect_answers)
                     VALUES (?1, ?2, ?3)",
                )
                .map_err(|e| AppError::Store(format!("Failed to prepare insert: {}", e)))?;

            for q in questions {
                let incorrect = serde_json::to_string(&q.incorrect_answers)?;
                stmt.execute(params![q.question, q.correct_answer, incorrect])
                    .map_err(|e| AppError::Store(format!("Failed to insert question: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit questions: {}", e)))?;

        Ok(questions.len())
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM questions", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| AppError::Store(format!("Failed to count questions: {}", e)))
    }

    fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM questions", [])
            .map_err(|e| AppError::Store(format!("Failed to delete questions: {}", e)))?;

        tracing::info!("Reset question store");
        Ok(())
    }
}

/// Decode the stored distractor list; a corrupt value reads as no distractors.
fn decode_answers(raw: &str) -> Vec<String> {
    match serde_json::from_str(raw) {
        Ok(answers) => answers,
        Err(e) => {
            tracing::warn!("Ignoring malformed incorrect_answers value: {}", e);
            Vec::new()
        }
    }
}
