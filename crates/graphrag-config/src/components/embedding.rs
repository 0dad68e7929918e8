//! Embedding model configuration with sensible defaults

use serde::{Deserialize, Serialize};

/// Embedding provider type - enum for TOML serialization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// Ollama provider (local or remote)
    #[default]
    Ollama,
    /// OpenAI or any OpenAI-compatible endpoint
    OpenAI,
    /// Deterministic hashing provider for offline use and tests
    Mock,
}

impl EmbeddingProviderType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Mock => "mock",
        }
    }

    /// Parse a provider name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAI),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// One embedding model entry (`[[models]]` in the config file)
///
/// Knowledge bases reference these by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingModelConfig {
    /// Identifier referenced from knowledge bases
    pub id: String,
    /// Provider serving the model
    #[serde(default)]
    pub provider: EmbeddingProviderType,
    /// Model name (defaults to a provider-appropriate model)
    pub model: Option<String>,
    /// Custom API endpoint
    pub api_url: Option<String>,
    /// Vector dimensions (defaults per provider/model)
    pub dimensions: Option<usize>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl EmbeddingModelConfig {
    /// Create a model entry with provider defaults
    pub fn new(id: impl Into<String>, provider: EmbeddingProviderType) -> Self {
        Self {
            id: id.into(),
            provider,
            model: None,
            api_url: None,
            dimensions: None,
            api_key_env: None,
            timeout_secs: None,
        }
    }

    /// Get the actual model name to use
    pub fn get_model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            EmbeddingProviderType::Ollama => "nomic-embed-text",
            EmbeddingProviderType::OpenAI => "text-embedding-3-small",
            EmbeddingProviderType::Mock => "mock-embedding",
        })
    }

    /// Get API URL for remote providers
    pub fn get_api_url(&self) -> Option<&str> {
        match self.provider {
            EmbeddingProviderType::Ollama => {
                self.api_url.as_deref().or(Some("http://localhost:11434"))
            }
            EmbeddingProviderType::OpenAI => self
                .api_url
                .as_deref()
                .or(Some("https://api.openai.com/v1")),
            EmbeddingProviderType::Mock => None,
        }
    }

    /// Expected vector dimensions
    pub fn get_dimensions(&self) -> usize {
        self.dimensions.unwrap_or_else(|| match self.provider {
            EmbeddingProviderType::Ollama => 768,
            EmbeddingProviderType::OpenAI => match self.get_model() {
                "text-embedding-3-large" => 3072,
                _ => 1536,
            },
            EmbeddingProviderType::Mock => 384,
        })
    }

    /// Timeout in seconds
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        let var = match (self.api_key_env.as_deref(), self.provider) {
            (Some(var), _) => var,
            (None, EmbeddingProviderType::OpenAI) => "OPENAI_API_KEY",
            (None, _) => return None,
        };
        std::env::var(var).ok().filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_defaults() {
        let ollama = EmbeddingModelConfig::new("local", EmbeddingProviderType::Ollama);
        assert_eq!(ollama.get_model(), "nomic-embed-text");
        assert_eq!(ollama.get_api_url(), Some("http://localhost:11434"));
        assert_eq!(ollama.get_dimensions(), 768);

        let openai = EmbeddingModelConfig::new("cloud", EmbeddingProviderType::OpenAI);
        assert_eq!(openai.get_dimensions(), 1536);

        let mock = EmbeddingModelConfig::new("test", EmbeddingProviderType::Mock);
        assert_eq!(mock.get_api_url(), None);
    }

    #[test]
    fn test_large_openai_model_dimensions() {
        let mut config = EmbeddingModelConfig::new("big", EmbeddingProviderType::OpenAI);
        config.model = Some("text-embedding-3-large".to_string());
        assert_eq!(config.get_dimensions(), 3072);
    }

    #[test]
    fn test_parse_provider_name() {
        assert_eq!(
            EmbeddingProviderType::parse("OpenAI"),
            Some(EmbeddingProviderType::OpenAI)
        );
        assert_eq!(EmbeddingProviderType::parse("cohere"), None);
    }

    #[test]
    fn test_model_entry_from_toml() {
        let toml = r#"
            id = "bge"
            provider = "openai"
            model = "bge-m3"
            api_url = "http://localhost:8080/v1"
            dimensions = 1024
        "#;
        let config: EmbeddingModelConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.id, "bge");
        assert_eq!(config.get_model(), "bge-m3");
        assert_eq!(config.get_dimensions(), 1024);
    }
}
