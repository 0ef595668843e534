//! LLM integration crate for CCNA Coach.
//!
//! This crate provides a provider-agnostic abstraction for the hosted
//! language model that grades practice answers. Providers sit behind the
//! [`LlmClient`] trait and are built by [`create_client`].
//!
//! # Providers
//! - **Azure OpenAI**: chat completions on an Azure deployment
//! - **OpenAI**: chat completions on api.openai.com or a compatible endpoint
//! - **Ollama**: local LLM runtime (default)
//!
//! # Example
//! ```no_run
//! use ccna_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("What does OSPF stand for?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, ClientOptions};
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
