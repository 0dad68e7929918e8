//! Deterministic test doubles for the core traits
//!
//! - [`ScriptedChat`]: answers by matching prompt substrings, records every prompt
//! - [`KeywordEmbedder`]: bag-of-words hashing embedder, similar text → similar vectors
//! - [`StaticTransformer`]: returns canned extractions per document text
//! - [`RecordingBackend`]: in-memory backend that counts calls and injects failures
//!
//! Available to other crates with the `test-utils` feature.

use crate::error::{GraphError, GraphResult, LlmError, LlmResult};
use crate::memory::InMemoryGraphBackend;
use crate::traits::{
    ChatProvider, ChatRequest, EmbeddingProvider, EmbeddingProviderFactory, EmbeddingResponse,
    GraphBackend, GraphTransformer, ModelDescriptor,
};
use crate::types::{
    DeleteSummary, GraphDocument, GraphEdge, GraphExport, GraphNode, GraphSchema,
    GraphStatistics, MatchMode, Namespace, ScoredNode, SourceDocument, Triple, UpsertSummary,
    VectorIndexSpec,
};
use async_trait::async_trait;
use graphrag_config::SimilarityFunction;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ----------------------------------------------------------------------------
// Chat
// ----------------------------------------------------------------------------

/// Chat provider with scripted responses
#[derive(Debug, Default)]
pub struct ScriptedChat {
    rules: Vec<(String, String)>,
    fallback: String,
    fail: bool,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self {
            fallback: "[]".to_string(),
            ..Default::default()
        }
    }

    /// Respond with `response` when the last message contains `needle`
    pub fn with_rule(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((needle.into(), response.into()));
        self
    }

    pub fn with_fallback(mut self, response: impl Into<String>) -> Self {
        self.fallback = response.into();
        self
    }

    /// Every call fails with an HTTP error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedChat {
    async fn chat(&self, request: ChatRequest) -> LlmResult<String> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(LlmError::HttpError("scripted failure".to_string()));
        }
        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

// ----------------------------------------------------------------------------
// Embeddings
// ----------------------------------------------------------------------------

/// Bag-of-words embedder: each lowercase alphanumeric token bumps one
/// hashed bucket, and the vector is L2-normalized.
#[derive(Debug)]
pub struct KeywordEmbedder {
    dimensions: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(64)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[fnv1a(token) as usize % self.dimensions] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> LlmResult<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::Unavailable("keyword embedder disabled".to_string()));
        }
        Ok(EmbeddingResponse::new(self.vector_for(text), "keyword"))
    }

    fn model_name(&self) -> &str {
        "keyword"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// Factory that hands out the same provider for every model
pub struct StaticEmbeddingFactory {
    provider: Arc<dyn EmbeddingProvider>,
}

impl StaticEmbeddingFactory {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

impl EmbeddingProviderFactory for StaticEmbeddingFactory {
    fn create(&self, _model: &ModelDescriptor) -> LlmResult<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::clone(&self.provider))
    }
}

// ----------------------------------------------------------------------------
// Extraction
// ----------------------------------------------------------------------------

/// Transformer with canned extractions keyed by document text
#[derive(Debug, Default)]
pub struct StaticTransformer {
    extractions: HashMap<String, (Vec<GraphNode>, Vec<GraphEdge>)>,
}

impl StaticTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(
        mut self,
        text: impl Into<String>,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    ) -> Self {
        self.extractions.insert(text.into(), (nodes, edges));
        self
    }
}

#[async_trait]
impl GraphTransformer for StaticTransformer {
    async fn extract(&self, document: &SourceDocument) -> GraphResult<GraphDocument> {
        let (nodes, edges) = self.extractions.get(&document.text).ok_or_else(|| {
            GraphError::Extraction(format!("no extraction scripted for {}", document.id))
        })?;
        Ok(GraphDocument {
            nodes: nodes.clone(),
            edges: edges.clone(),
            source: document.clone(),
        })
    }
}

// ----------------------------------------------------------------------------
// Backend
// ----------------------------------------------------------------------------

/// Call counters of a [`RecordingBackend`]
#[derive(Debug, Default)]
pub struct BackendCalls {
    pub upsert: AtomicUsize,
    pub vector_search: AtomicUsize,
    pub match_entities: AtomicUsize,
    pub expand: AtomicUsize,
    pub create_index: AtomicUsize,
}

/// In-memory backend that records calls and can fail selected reads
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: InMemoryGraphBackend,
    pub calls: BackendCalls,
    fail_vector_search: AtomicBool,
    fail_match: AtomicBool,
    fail_statistics: AtomicBool,
    index_never_ready: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_vector_search(&self, fail: bool) {
        self.fail_vector_search.store(fail, Ordering::SeqCst);
    }

    pub fn fail_match(&self, fail: bool) {
        self.fail_match.store(fail, Ordering::SeqCst);
    }

    pub fn fail_statistics(&self, fail: bool) {
        self.fail_statistics.store(fail, Ordering::SeqCst);
    }

    pub fn index_never_ready(&self, never: bool) {
        self.index_never_ready.store(never, Ordering::SeqCst);
    }

    pub fn expand_calls(&self) -> usize {
        self.calls.expand.load(Ordering::SeqCst)
    }
}

fn injected(what: &str) -> GraphError {
    GraphError::Query(format!("injected {} failure", what))
}

#[async_trait]
impl GraphBackend for RecordingBackend {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn upsert_graph(
        &self,
        namespace: &Namespace,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        source: Option<&SourceDocument>,
    ) -> GraphResult<UpsertSummary> {
        self.calls.upsert.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_graph(namespace, nodes, edges, source).await
    }

    async fn create_vector_index(
        &self,
        namespace: &Namespace,
        spec: &VectorIndexSpec,
    ) -> GraphResult<()> {
        self.calls.create_index.fetch_add(1, Ordering::SeqCst);
        self.inner.create_vector_index(namespace, spec).await
    }

    async fn vector_index_ready(&self, namespace: &Namespace) -> GraphResult<bool> {
        if self.index_never_ready.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.vector_index_ready(namespace).await
    }

    async fn vector_search(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        limit: usize,
        similarity: SimilarityFunction,
    ) -> GraphResult<Vec<ScoredNode>> {
        self.calls.vector_search.fetch_add(1, Ordering::SeqCst);
        if self.fail_vector_search.load(Ordering::SeqCst) {
            return Err(injected("vector search"));
        }
        self.inner
            .vector_search(namespace, vector, limit, similarity)
            .await
    }

    async fn match_entities(
        &self,
        namespace: &Namespace,
        name: &str,
        mode: MatchMode,
        limit: usize,
    ) -> GraphResult<Vec<String>> {
        self.calls.match_entities.fetch_add(1, Ordering::SeqCst);
        if self.fail_match.load(Ordering::SeqCst) {
            return Err(injected("entity match"));
        }
        self.inner.match_entities(namespace, name, mode, limit).await
    }

    async fn expand(
        &self,
        namespace: &Namespace,
        anchors: &[String],
        hop_depth: u8,
        limit: usize,
    ) -> GraphResult<Vec<Triple>> {
        self.calls.expand.fetch_add(1, Ordering::SeqCst);
        self.inner.expand(namespace, anchors, hop_depth, limit).await
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> GraphResult<DeleteSummary> {
        self.inner.delete_namespace(namespace).await
    }

    async fn delete_document(
        &self,
        namespace: &Namespace,
        document_id: &str,
    ) -> GraphResult<DeleteSummary> {
        self.inner.delete_document(namespace, document_id).await
    }

    async fn statistics(&self, namespace: &Namespace) -> GraphResult<GraphStatistics> {
        if self.fail_statistics.load(Ordering::SeqCst) {
            return Err(injected("statistics"));
        }
        self.inner.statistics(namespace).await
    }

    async fn schema(&self, namespace: &Namespace) -> GraphResult<GraphSchema> {
        self.inner.schema(namespace).await
    }

    async fn export(&self, namespace: &Namespace) -> GraphResult<GraphExport> {
        self.inner.export(namespace).await
    }

    async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }

    async fn close(&self) -> GraphResult<()> {
        self.inner.close().await
    }
}
