//! Index command handler.
//!
//! Embeds every stored question into the semantic index.

use super::{open_index, open_store};
use ccna_core::{config::AppConfig, AppResult};
use ccna_knowledge::{build_index, IndexOptions};
use clap::Args;

/// Embed stored questions into the semantic index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Drop every indexed question before rebuilding
    #[arg(long)]
    pub reset: bool,

    /// Questions per embedding batch (default: embedding.batchSize)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command");

        let store = open_store(config)?;
        let index = open_index(config)?;

        let options = IndexOptions {
            batch_size: self.batch_size.unwrap_or(config.embedding.batch_size),
            reset: self.reset,
        };
        let stats = build_index(&store, &index, &options).await?;

        if self.json {
            let output = serde_json::json!({
                "indexed": stats.indexed,
                "batches": stats.batches,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} questions in {} batches ({:.2}s)",
                stats.indexed, stats.batches, stats.duration_secs
            );
        }

        Ok(())
    }
}
