//! Command handlers for the ccna-coach CLI.
//!
//! Each subcommand lives in its own module; the store and index openers are
//! shared so every command resolves the same paths from config.

pub mod index;
pub mod populate;
pub mod serve;
pub mod stats;

pub use index::IndexCommand;
pub use populate::PopulateCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;

use ccna_core::{config::AppConfig, AppResult};
use ccna_knowledge::{create_provider, SqliteQuestionStore, SqliteSemanticIndex};
use std::time::Duration;

pub(crate) fn open_store(config: &AppConfig) -> AppResult<SqliteQuestionStore> {
    SqliteQuestionStore::open(&config.database_path())
}

pub(crate) fn open_index(config: &AppConfig) -> AppResult<SqliteSemanticIndex> {
    let embedder = create_provider(
        &config.embedding,
        Duration::from_secs(config.server.request_timeout_secs),
    )?;
    SqliteSemanticIndex::open(&config.index_path(), &config.storage.collection, embedder)
}
