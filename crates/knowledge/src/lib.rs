//! Question bank storage and semantic retrieval.
//!
//! - [`store`]: the question store (SQLite), looked up by exact question text
//! - [`sqlite_index`]: the semantic index (SQLite + embeddings), keyed by question id
//! - [`seed`] and [`indexer`]: the one-time populate and index jobs

pub mod embeddings;
pub mod indexer;
pub mod seed;
pub mod semantic_index;
pub mod sqlite_index;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use indexer::build_index;
pub use seed::{load_seed_file, populate};
pub use semantic_index::SemanticIndex;
pub use sqlite_index::SqliteSemanticIndex;
pub use store::{QuestionStore, SqliteQuestionStore};
pub use types::{
    AnswerSet, CollectionInfo, IndexOptions, IndexStats, SearchHit, SeedQuestion, SeedStats,
};
