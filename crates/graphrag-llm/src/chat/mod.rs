//! Chat provider implementations

pub mod ollama;
pub mod openai;

// Re-export providers
pub use ollama::OllamaChatProvider;
pub use openai::OpenAIChatProvider;

use graphrag_config::{ChatConfig, LlmProviderType};
use graphrag_core::{ChatProvider, LlmError, LlmResult};
use std::sync::Arc;

/// Create a chat provider from configuration
pub fn create_chat_provider(config: &ChatConfig) -> LlmResult<Arc<dyn ChatProvider>> {
    if !config.enabled {
        return Err(LlmError::ConfigError("chat model is disabled".to_string()));
    }

    let temperature = Some(config.temperature());
    match config.provider {
        LlmProviderType::Ollama => {
            let provider = OllamaChatProvider::new(
                config.llm_endpoint(),
                config.chat_model(),
                config.timeout_secs(),
            )
            .with_defaults(temperature, config.max_tokens);
            Ok(Arc::new(provider))
        }
        LlmProviderType::OpenAI => {
            let api_key = config.api_key();
            if api_key.is_none() && config.endpoint.is_none() {
                return Err(LlmError::ConfigError(format!(
                    "{} not set",
                    config.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY")
                )));
            }

            let provider = OpenAIChatProvider::new(
                api_key,
                Some(config.llm_endpoint()),
                config.chat_model(),
                config.timeout_secs(),
            )
            .with_defaults(temperature, config.max_tokens);
            Ok(Arc::new(provider))
        }
    }
}
