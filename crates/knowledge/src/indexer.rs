//! Build the semantic index from the question store.

use crate::semantic_index::SemanticIndex;
use crate::store::QuestionStore;
use crate::types::{IndexOptions, IndexStats};
use ccna_core::{AppError, AppResult};
use std::time::Instant;

/// Embed every stored question and upsert it into the index.
///
/// Documents are keyed by question id, so re-running without `reset`
/// refreshes existing entries rather than duplicating them.
pub async fn build_index(
    store: &dyn QuestionStore,
    index: &dyn SemanticIndex,
    options: &IndexOptions,
) -> AppResult<IndexStats> {
    if options.batch_size == 0 {
        return Err(AppError::Config(
            "Embedding batch size must be greater than zero".to_string(),
        ));
    }

    let start = Instant::now();

    if options.reset {
        index.reset()?;
    }

    let questions = store.question_texts()?;
    let total = questions.len();
    tracing::info!("Indexing {} questions", total);

    let mut indexed = 0usize;
    let mut batches = 0usize;

    for batch in questions.chunks(options.batch_size) {
        index.upsert(batch).await?;
        indexed += batch.len();
        batches += 1;
        tracing::debug!("Indexed {}/{} questions", indexed, total);
    }

    let duration = start.elapsed();
    tracing::info!(
        "Index build completed: {} questions in {} batches, {:.2}s",
        indexed,
        batches,
        duration.as_secs_f64()
    );

    Ok(IndexStats {
        indexed,
        batches,
        duration_secs: duration.as_secs_f64(),
    })
}
