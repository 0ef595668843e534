//! Stats command handler.
//!
//! Reports how many questions are stored and indexed.

use super::{open_index, open_store};
use ccna_core::{config::AppConfig, AppResult};
use ccna_knowledge::{QuestionStore, SemanticIndex};
use clap::Args;

/// Show question and index counts
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let questions = open_store(config)?.count()?;
        let index = open_index(config)?;
        let indexed = index.count()?;
        let info = index.info()?;

        if self.json {
            let output = serde_json::json!({
                "questions": questions,
                "indexed": indexed,
                "collection": info,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Questions stored:  {}", questions);
            println!("Questions indexed: {}", indexed);
            println!(
                "Collection:        {} ({} / {}, {} dims)",
                info.name, info.provider, info.model, info.dimensions
            );
            if indexed < questions {
                println!("Index is behind the store; run `ccna-coach index`");
            }
        }

        Ok(())
    }
}
