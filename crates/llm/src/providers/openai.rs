//! OpenAI-compatible chat completions provider.
//!
//! Serves both api.openai.com (bearer auth, model in the body) and Azure
//! OpenAI (`api-key` header, deployment in the path, `api-version` query).

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ccna_core::{AppError, AppResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// Which wire dialect the endpoint speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAiFlavor {
    OpenAI,
    Azure { api_version: String },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Chat completions client for OpenAI and Azure OpenAI.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    flavor: OpenAiFlavor,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Client for api.openai.com or a compatible endpoint.
    pub fn openai(base_url: Option<&str>, api_key: impl Into<String>) -> Self {
        Self::new(
            base_url.unwrap_or(DEFAULT_OPENAI_URL),
            api_key,
            OpenAiFlavor::OpenAI,
            reqwest::Client::new(),
        )
    }

    /// Client for an Azure OpenAI resource endpoint.
    pub fn azure(
        endpoint: &str,
        api_key: impl Into<String>,
        api_version: Option<&str>,
    ) -> Self {
        Self::new(
            endpoint,
            api_key,
            OpenAiFlavor::Azure {
                api_version: api_version.unwrap_or(DEFAULT_AZURE_API_VERSION).to_string(),
            },
            reqwest::Client::new(),
        )
    }

    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        flavor: OpenAiFlavor,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            flavor,
            client,
        }
    }

    /// Completion URL; on Azure the model names the deployment.
    fn completions_url(&self, model: &str) -> String {
        match &self.flavor {
            OpenAiFlavor::OpenAI => format!("{}/v1/chat/completions", self.base_url),
            OpenAiFlavor::Azure { api_version } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, model, api_version
            ),
        }
    }

    fn to_chat_request<'a>(&self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let model = match self.flavor {
            OpenAiFlavor::OpenAI => Some(request.model.as_str()),
            OpenAiFlavor::Azure { .. } => None,
        };

        ChatRequest {
            model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        match self.flavor {
            OpenAiFlavor::OpenAI => "openai",
            OpenAiFlavor::Azure { .. } => "azure-openai",
        }
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(
            provider = self.provider_name(),
            model = %request.model,
            "Sending chat completion request"
        );

        let url = self.completions_url(&request.model);
        let body = self.to_chat_request(request);

        let builder = self.client.post(&url).json(&body);
        let builder = match self.flavor {
            OpenAiFlavor::OpenAI => builder.bearer_auth(&self.api_key),
            OpenAiFlavor::Azure { .. } => builder.header("api-key", &self.api_key),
        };

        let response = builder.send().await.map_err(|e| {
            AppError::Llm(format!(
                "Failed to send request to {}: {}",
                self.provider_name(),
                e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AppError::RateLimited(error_text));
            }
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                self.provider_name(),
                status,
                error_text
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse chat completion response: {}", e))
        })?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Llm("Chat completion returned no content".to_string()))?;

        let usage = chat
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        tracing::info!(total_tokens = usage.total_tokens, "Received chat completion");

        Ok(LlmResponse {
            content,
            model: chat.model.unwrap_or_else(|| request.model.clone()),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        json!({
            "model": "gpt-4",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 200, "completion_tokens": 50, "total_tokens": 250}
        })
    }

    #[test]
    fn test_completion_urls() {
        let openai = OpenAiClient::openai(None, "sk-test");
        assert_eq!(
            openai.completions_url("gpt-4"),
            "https://api.openai.com/v1/chat/completions"
        );

        let azure = OpenAiClient::azure("https://coach.openai.azure.com/", "key", None);
        assert_eq!(
            azure.completions_url("gpt4-deploy"),
            "https://coach.openai.azure.com/openai/deployments/gpt4-deploy/chat/completions?api-version=2024-02-01"
        );
        assert_eq!(azure.provider_name(), "azure-openai");
    }

    #[test]
    fn test_system_message_comes_first() {
        let client = OpenAiClient::openai(None, "sk-test");
        let request = LlmRequest::new("Grade these", "gpt-4").with_system("You are a CCNA exam coach.");
        let chat = client.to_chat_request(&request);

        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[1].role, "user");
        assert_eq!(chat.messages[1].content, "Grade these");
        assert_eq!(chat.model, Some("gpt-4"));
    }

    #[tokio::test]
    async fn test_azure_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4/chat/completions"))
            .and(query_param("api-version", "2024-02-01"))
            .and(header("api-key", "azure-key"))
            .and(body_partial_json(json!({
                "messages": [{"role": "system", "content": "You are a CCNA exam coach."}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Nice work.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::azure(&server.uri(), "azure-key", Some("2024-02-01"));
        let request =
            LlmRequest::new("Question 1: ...", "gpt-4").with_system("You are a CCNA exam coach.");
        let response = client.complete(&request).await.unwrap();

        assert_eq!(response.content, "Nice work.");
        assert_eq!(response.usage.total_tokens, 250);
    }

    #[tokio::test]
    async fn test_openai_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::openai(Some(&server.uri()), "sk-test");
        let response = client
            .complete(&LlmRequest::new("hi", "gpt-4"))
            .await
            .unwrap();
        assert_eq!(response.content, "ok");
    }

    #[tokio::test]
    async fn test_rate_limit_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit reached"))
            .mount(&server)
            .await;

        let client = OpenAiClient::azure(&server.uri(), "azure-key", None);
        let err = client
            .complete(&LlmRequest::new("hi", "gpt-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenAiClient::openai(Some(&server.uri()), "sk-test");
        let err = client
            .complete(&LlmRequest::new("hi", "gpt-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
