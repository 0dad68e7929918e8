//! OpenAI chat provider implementation

use crate::http::{endpoint, send_json};
use async_trait::async_trait;
use graphrag_core::{ChatProvider, ChatRequest, LlmError, LlmResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible chat provider (`POST /chat/completions`)
pub struct OpenAIChatProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    default_model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl OpenAIChatProvider {
    /// Create a new OpenAI provider
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            default_model: model,
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Sampling defaults for requests that set none
    pub fn with_defaults(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.default_model,
            "messages": request.messages.iter().map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            }).collect::<Vec<_>>(),
        });

        if let Some(temperature) = request.temperature.or(self.temperature) {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }
}

// OpenAI API response types
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u32,
}

#[async_trait]
impl ChatProvider for OpenAIChatProvider {
    async fn chat(&self, request: ChatRequest) -> LlmResult<String> {
        let mut http_request = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .json(&self.build_body(&request));
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response: OpenAIResponse = send_json("OpenAI", http_request, self.timeout).await?;
        debug!(
            model = %self.default_model,
            tokens = response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "OpenAI chat completed"
        );

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.default_model
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}
