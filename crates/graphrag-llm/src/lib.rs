//! # GraphRAG LLM
//!
//! Model providers for the GraphRAG engine.
//!
//! ## Modules
//!
//! - [`embeddings`]: Ollama, OpenAI-compatible and mock embedding providers
//! - [`chat`]: Ollama and OpenAI-compatible chat providers
//! - [`extraction`]: chat-model graph extraction ([`LlmGraphTransformer`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphrag_config::{EmbeddingModelConfig, EmbeddingProviderType};
//! use graphrag_llm::create_provider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EmbeddingModelConfig::new("local", EmbeddingProviderType::Ollama);
//!     let provider = create_provider(&config)?;
//!     let response = provider.embed("Hello, world!").await?;
//!
//!     println!("Generated embedding with {} dimensions", response.dimensions);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod chat;
pub mod embeddings;
pub mod extraction;
mod http;

pub use chat::{create_chat_provider, OllamaChatProvider, OpenAIChatProvider};
pub use embeddings::{
    create_provider, MockEmbeddingProvider, OllamaEmbeddingProvider, OpenAIEmbeddingProvider,
    ProviderFactory,
};
pub use extraction::LlmGraphTransformer;
