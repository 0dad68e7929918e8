//! Simple chat configuration

use serde::{Deserialize, Serialize};

/// Default chat model for Ollama
pub const DEFAULT_CHAT_MODEL: &str = "llama3.1";
/// Default sampling temperature. Extraction and answering both want low variance.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
/// Default API timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// LLM provider type for chat
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Ollama `/api/chat`
    #[default]
    Ollama,
    /// OpenAI-compatible `/chat/completions`
    OpenAI,
}

/// Chat model configuration, used for entity extraction, graph extraction
/// and answer synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Whether a chat model is available at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProviderType,
    /// Chat model name
    pub model: Option<String>,
    /// LLM endpoint URL
    pub endpoint: Option<String>,
    /// Temperature for generation (0.0-2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// API timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: LlmProviderType::Ollama,
            model: None,
            endpoint: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
            api_key_env: None,
        }
    }
}

impl ChatConfig {
    /// Get the LLM endpoint, using provider-specific default if not specified
    pub fn llm_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| match self.provider {
                LlmProviderType::Ollama => "http://localhost:11434".to_string(),
                LlmProviderType::OpenAI => "https://api.openai.com/v1".to_string(),
            })
    }

    /// Get the chat model, using default if not specified
    pub fn chat_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider {
            LlmProviderType::Ollama => DEFAULT_CHAT_MODEL.to_string(),
            LlmProviderType::OpenAI => "gpt-4o-mini".to_string(),
        })
    }

    /// Get the temperature, using default if not specified
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Get timeout in seconds, using default if not specified
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        let var = self.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
        std::env::var(var).ok().filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert!(config.enabled);
        assert_eq!(config.llm_endpoint(), "http://localhost:11434");
        assert_eq!(config.chat_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(config.temperature(), 0.0);
    }

    #[test]
    fn test_openai_defaults() {
        let config: ChatConfig = toml::from_str(r#"provider = "openai""#).unwrap();
        assert_eq!(config.llm_endpoint(), "https://api.openai.com/v1");
        assert_eq!(config.chat_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_disabled_chat() {
        let config: ChatConfig = toml::from_str("enabled = false").unwrap();
        assert!(!config.enabled);
    }
}
