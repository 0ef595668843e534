//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answers looked up for one question text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// One entry of the seed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedQuestion {
    pub question: String,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}

/// A candidate returned by the semantic index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Question id the document was indexed under
    pub id: i64,

    /// Indexed question text
    pub document: String,

    /// Cosine similarity to the query (-1.0 to 1.0)
    pub score: f32,
}

/// Embedding settings an index collection was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub created_at: DateTime<Utc>,
}

/// Statistics from a populate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedStats {
    /// Number of questions inserted
    pub inserted: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Options for an index build.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Number of questions embedded per request
    pub batch_size: usize,

    /// Clear the collection before indexing
    pub reset: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            reset: false,
        }
    }
}

/// Statistics from an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of questions embedded and upserted
    pub indexed: usize,

    /// Number of embedding batches sent
    pub batches: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}
