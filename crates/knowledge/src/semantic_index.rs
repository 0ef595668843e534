//! Semantic index abstraction.
//!
//! Maps question texts to embeddings and answers nearest-neighbour queries.
//! Queries are batched: one result list per query text, in input order.

use crate::types::SearchHit;
use ccna_core::AppResult;

/// Trait for semantic index backends.
#[async_trait::async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Embed and insert or replace `(id, document)` pairs.
    async fn upsert(&self, records: &[(i64, String)]) -> AppResult<()>;

    /// Top-`top_k` hits for each query, ordered by descending similarity.
    async fn query(&self, queries: &[String], top_k: usize) -> AppResult<Vec<Vec<SearchHit>>>;

    /// Number of indexed documents.
    fn count(&self) -> AppResult<usize>;

    /// Remove every document from the collection.
    fn reset(&self) -> AppResult<()>;
}
