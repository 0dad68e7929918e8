//! Ollama chat provider implementation

use crate::http::{endpoint, send_json};
use async_trait::async_trait;
use graphrag_core::{ChatProvider, ChatRequest, LlmResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Ollama chat provider (`POST /api/chat`, non-streaming)
pub struct OllamaChatProvider {
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl OllamaChatProvider {
    /// Create a new Ollama provider
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
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
            "stream": false,
        });

        let mut options = serde_json::Map::new();
        if let Some(temperature) = request.temperature.or(self.temperature) {
            options.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if let Some(max_tokens) = request.max_tokens.or(self.max_tokens) {
            options.insert("num_predict".to_string(), serde_json::json!(max_tokens));
        }
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ChatProvider for OllamaChatProvider {
    async fn chat(&self, request: ChatRequest) -> LlmResult<String> {
        let http_request = self
            .client
            .post(endpoint(&self.base_url, "/api/chat"))
            .json(&self.build_body(&request));

        let response: OllamaResponse = send_json("Ollama", http_request, self.timeout).await?;
        debug!(
            model = %self.default_model,
            tokens = response.eval_count.unwrap_or(0),
            "Ollama chat completed"
        );
        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.default_model
    }

    fn provider_name(&self) -> &str {
        "Ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphrag_core::ChatMessage;

    #[test]
    fn test_body_uses_request_then_provider_defaults() {
        let provider = OllamaChatProvider::new("http://localhost:11434".into(), "llama3.1".into(), 60)
            .with_defaults(Some(0.0), Some(512));

        let body = provider.build_body(&ChatRequest::prompt("hi"));
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["options"]["temperature"], 0.0);
        assert_eq!(body["options"]["num_predict"], 512);

        let request = ChatRequest::new(vec![ChatMessage::system("rules"), ChatMessage::user("q")])
            .with_temperature(0.5);
        let body = provider.build_body(&request);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["options"]["temperature"], 0.5);
    }

    #[test]
    fn test_no_options_when_unset() {
        let provider = OllamaChatProvider::new("http://x".into(), "m".into(), 5);
        let body = provider.build_body(&ChatRequest::prompt("hi"));
        assert!(body.get("options").is_none());
        assert_eq!(provider.provider_name(), "Ollama");
        assert_eq!(provider.model_name(), "m");
    }
}
