//! Populate command handler.
//!
//! Loads a JSON seed file into the question store.

use super::open_store;
use ccna_core::{config::AppConfig, AppResult};
use clap::Args;
use std::path::PathBuf;

/// Load questions from a JSON seed file
#[derive(Args, Debug)]
pub struct PopulateCommand {
    /// JSON array of {question, correct_answer, incorrect_answers}
    pub seed: PathBuf,

    /// Delete existing questions first
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PopulateCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing populate command from {:?}", self.seed);

        let store = open_store(config)?;
        let stats = ccna_knowledge::populate(&store, &self.seed, self.reset)?;

        if self.json {
            let output = serde_json::json!({
                "inserted": stats.inserted,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Inserted {} questions into {:?} in {:.2}s",
                stats.inserted,
                config.database_path(),
                stats.duration_secs
            );
        }

        Ok(())
    }
}
