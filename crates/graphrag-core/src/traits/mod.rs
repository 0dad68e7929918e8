//! Core abstractions for the dependency-inverted GraphRAG architecture
//!
//! Core defines the traits; implementations depend on core:
//!
//! ```text
//! ┌──────────────────┐
//! │  GraphRagService │  ← Orchestrator (defines traits, coordinates operations)
//! │   - GraphBackend │
//! │   - Embedding    │
//! │   - Chat         │
//! │   - Transformer  │
//! └────────┬─────────┘
//!          │ uses (trait objects)
//!          ▼
//! ┌──────────────────┐
//! │ Implementations  │  ← Depend on core for trait definitions
//! │  - SurrealDB     │
//! │  - InMemory      │
//! │  - Ollama/OpenAI │
//! └──────────────────┘
//! ```

pub mod backend;
pub mod chat;
pub mod directory;
pub mod embedding;
pub mod transformer;

pub use backend::GraphBackend;
pub use chat::{ChatMessage, ChatProvider, ChatRequest, MessageRole};
pub use directory::{
    EmbeddingProviderFactory, KnowledgeBase, KnowledgeBaseDirectory, ModelDescriptor,
    ModelDirectory,
};
pub use embedding::{EmbeddingProvider, EmbeddingResponse};
pub use transformer::GraphTransformer;
