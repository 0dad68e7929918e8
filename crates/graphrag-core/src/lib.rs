//! # GraphRAG core
//!
//! Domain types, traits and the hybrid graph-retrieval engine.
//!
//! - [`GraphStore`] writes and administers a namespace's graph through a
//!   [`GraphBackend`](traits::GraphBackend)
//! - [`GraphWriter`] normalizes extraction output into idempotent upserts
//! - [`GraphRetriever`] finds anchors (vector and entity-name paths) and
//!   expands them into triples
//! - [`GraphRagService`] ties ingestion and hybrid retrieval together
//!
//! Storage and model providers live in other crates and are injected as
//! trait objects.

pub mod directory;
pub mod error;
pub mod memory;
pub mod prompts;
pub mod resolver;
pub mod retriever;
pub mod retry;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use directory::StaticDirectory;
pub use error::{GraphError, GraphResult, LlmError, LlmResult};
pub use memory::InMemoryGraphBackend;
pub use resolver::EmbeddingResolver;
pub use retriever::GraphRetriever;
pub use retry::{poll_until, retry_with_backoff, PollOutcome, RetryPolicy};
pub use service::{GraphAnswer, GraphRagService, HybridOptions, HybridRetrieval};
pub use store::GraphStore;
pub use traits::{
    ChatMessage, ChatProvider, ChatRequest, EmbeddingProvider, EmbeddingProviderFactory,
    EmbeddingResponse, GraphBackend, GraphTransformer, KnowledgeBase, KnowledgeBaseDirectory,
    MessageRole, ModelDescriptor, ModelDirectory,
};
pub use types::{
    AnchorSet, DeleteSummary, GraphDocument, GraphEdge, GraphExport, GraphNode, GraphSchema,
    GraphStatistics, IngestionFailure, IngestionReport, MatchMode, Namespace, SchemaPattern,
    ScoredNode, SourceDocument, Triple, UpsertSummary, VectorIndexSpec,
};
pub use writer::{GraphWriter, PreparedGraph};
