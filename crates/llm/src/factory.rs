//! LLM provider factory.
//!
//! Builds a client for the configured provider kind, injecting the endpoint,
//! API key and HTTP timeout resolved by the caller.

use crate::client::LlmClient;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::openai::{DEFAULT_AZURE_API_VERSION, DEFAULT_OPENAI_URL};
use crate::providers::{OllamaClient, OpenAiClient, OpenAiFlavor};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Optional knobs shared by every provider.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Azure `api-version` query parameter
    pub api_version: Option<String>,

    /// Per-request HTTP timeout
    pub timeout: Option<Duration>,
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider kind ("azure-openai", "openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL (required for Azure)
/// * `api_key` - API key for hosted providers
/// * `options` - Azure API version and HTTP timeout
///
/// # Errors
/// Returns error if the provider is unknown, a hosted provider has no API
/// key, Azure has no endpoint, or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    options: ClientOptions,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    let api_key = api_key.unwrap_or_default();
    if provider_type.requires_api_key() && api_key.is_empty() {
        return Err(format!(
            "Provider '{}' requires API key",
            provider_type.as_str()
        ));
    }

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    let http = builder
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    tracing::debug!("Building {} client", provider_type.as_str());

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_http_client(base_url, http)))
        }
        ProviderType::OpenAI => {
            let base_url = endpoint.unwrap_or(DEFAULT_OPENAI_URL);
            Ok(Arc::new(OpenAiClient::new(
                base_url,
                api_key,
                OpenAiFlavor::OpenAI,
                http,
            )))
        }
        ProviderType::AzureOpenAI => {
            let endpoint = endpoint.ok_or("Azure OpenAI provider requires an endpoint")?;
            let api_version = options
                .api_version
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
            Ok(Arc::new(OpenAiClient::new(
                endpoint,
                api_key,
                OpenAiFlavor::Azure { api_version },
                http,
            )))
        }
    }
}
