//! Serve command handler.
//!
//! Wires the store, index, language model and feedback prompt into the HTTP
//! API and runs it until Ctrl-C.

use super::{open_index, open_store};
use ccna_core::{config::AppConfig, AppError, AppResult};
use ccna_knowledge::SemanticIndex;
use ccna_llm::{create_client, ClientOptions};
use ccna_prompt::{load_prompt, FEEDBACK_PROMPT_ID};
use ccna_server::{App, FeedbackAssembler, RetrievalFilter};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

/// Serve the search and feedback API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind, overriding config (e.g. 0.0.0.0:5000)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Number of request worker threads
    #[arg(long)]
    pub workers: Option<usize>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        config.validate()?;

        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        let workers = self.workers.unwrap_or(config.server.workers);
        let timeout = Duration::from_secs(config.server.request_timeout_secs);

        let store = Arc::new(open_store(config)?);
        let index = Arc::new(open_index(config)?);
        if index.count()? == 0 {
            tracing::warn!("Semantic index is empty; run `ccna-coach index` first");
        }

        let api_key = config.resolve_api_key();
        let endpoint = config.provider_endpoint();
        let client = create_client(
            config.provider_kind(),
            endpoint.as_deref(),
            api_key.as_deref(),
            ClientOptions {
                api_version: config.provider_api_version(),
                timeout: Some(timeout),
            },
        )
        .map_err(AppError::Config)?;
        tracing::info!(
            "Using {} model '{}'",
            client.provider_name(),
            config.model
        );

        let prompt = load_prompt(&config.workspace, FEEDBACK_PROMPT_ID)?;

        let app = App::new(
            RetrievalFilter::new(index, store, config.top_k, timeout),
            FeedbackAssembler::new(client, prompt, config.model.clone(), timeout),
        );

        ccna_server::serve(Arc::new(app), bind, workers).await
    }
}
