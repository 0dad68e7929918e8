//! GraphRagService: ingestion pipeline and hybrid retrieval
//!
//! ## Hybrid retrieval
//!
//! 1. Ensure the namespace's vector index (only when an embedding model resolves).
//! 2. Run the vector path and the entity path concurrently, each under its
//!    own timeout. A failed or timed-out path contributes no anchors.
//! 3. Merge anchors: vector path first, then entity path, first seen wins.
//! 4. No anchors: return nothing without expanding.
//! 5. Otherwise expand the anchors into triples.

use crate::error::{GraphError, GraphResult};
use crate::prompts;
use crate::resolver::EmbeddingResolver;
use crate::retriever::GraphRetriever;
use crate::store::GraphStore;
use crate::traits::{ChatProvider, ChatRequest, EmbeddingProvider, GraphTransformer};
use crate::types::{
    AnchorSet, DeleteSummary, GraphExport, GraphSchema, GraphStatistics, IngestionReport,
    Namespace, SourceDocument, Triple,
};
use crate::writer::GraphWriter;
use graphrag_config::{ExtractionConfig, RetrievalConfig};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-call tunables for hybrid retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct HybridOptions {
    pub vector_score_threshold: f32,
    pub vector_limit: usize,
    pub entity_match_limit: usize,
    pub hop_depth: u8,
    pub max_triples: usize,
    /// Applied to each path separately
    pub timeout: Duration,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl HybridOptions {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            vector_score_threshold: config.vector_score_threshold,
            vector_limit: config.vector_limit,
            entity_match_limit: config.entity_match_limit,
            hop_depth: config.hop_depth,
            max_triples: config.max_triples,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn with_hop_depth(mut self, hop_depth: u8) -> Self {
        self.hop_depth = hop_depth;
        self
    }

    pub fn with_max_triples(mut self, max_triples: usize) -> Self {
        self.max_triples = max_triples;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.vector_score_threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Diagnostic record of one hybrid retrieval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridRetrieval {
    pub vector_anchors: AnchorSet,
    pub entity_names: Vec<String>,
    pub entity_anchors: AnchorSet,
    /// Merged anchors, vector path first
    pub anchors: AnchorSet,
    pub vector_error: Option<String>,
    pub entity_error: Option<String>,
    pub triples: Vec<Triple>,
}

/// Answer produced by `retrieve_with_answer_hybrid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAnswer {
    pub answer: String,
    pub triples: Vec<Triple>,
    /// Whether any triples backed the answer
    pub found: bool,
}

impl GraphAnswer {
    pub fn not_found() -> Self {
        Self {
            answer: prompts::NOT_FOUND_ANSWER.to_string(),
            triples: Vec::new(),
            found: false,
        }
    }
}

/// Orchestrates ingestion and hybrid retrieval for every namespace
pub struct GraphRagService {
    retriever: GraphRetriever,
    writer: GraphWriter,
    chat: Option<Arc<dyn ChatProvider>>,
    defaults: HybridOptions,
    temperature: Option<f32>,
}

impl GraphRagService {
    pub fn new(store: GraphStore, resolver: Arc<EmbeddingResolver>) -> Self {
        Self {
            retriever: GraphRetriever::new(store.clone(), resolver),
            writer: GraphWriter::new(store),
            chat: None,
            defaults: HybridOptions::default(),
            temperature: None,
        }
    }

    /// Chat model used for entity extraction and answers. Without one the
    /// entity path returns nothing.
    pub fn with_chat(mut self, chat: Arc<dyn ChatProvider>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn with_defaults(mut self, defaults: HybridOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Apply the node type allow-list used when writing
    pub fn with_extraction_config(mut self, config: &ExtractionConfig) -> Self {
        self.writer = GraphWriter::from_config(self.writer.store().clone(), config);
        self
    }

    pub fn defaults(&self) -> &HybridOptions {
        &self.defaults
    }

    pub fn retriever(&self) -> &GraphRetriever {
        &self.retriever
    }

    pub fn store(&self) -> &GraphStore {
        self.retriever.store()
    }

    /// Embedding provider configured for the namespace, if any
    pub fn resolve_embedding_model(&self, namespace: &Namespace) -> Option<Arc<dyn EmbeddingProvider>> {
        self.retriever.resolver().resolve(namespace)
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Extract and write each document. A failing document is logged,
    /// recorded in the report and skipped.
    pub async fn process_documents(
        &self,
        namespace: &Namespace,
        documents: &[SourceDocument],
        transformer: &dyn GraphTransformer,
        include_source: bool,
        with_embedding: bool,
    ) -> IngestionReport {
        let mut report = IngestionReport {
            documents: documents.len(),
            ..Default::default()
        };

        let embedder = if with_embedding {
            self.resolve_embedding_model(namespace)
        } else {
            None
        };
        if let Some(embedder) = &embedder {
            self.ensure_index_for(namespace, embedder.as_ref()).await;
        }

        for document in documents {
            let graph = match transformer.extract(document).await {
                Ok(graph) => graph,
                Err(e) => {
                    warn!(namespace = %namespace, document = %document.id, "Extraction failed: {}", e);
                    report.record_failure(&document.id, e);
                    continue;
                }
            };

            match self
                .writer
                .write(namespace, &graph, embedder.as_deref(), include_source)
                .await
            {
                Ok(summary) => report.record(&summary),
                Err(e) => {
                    warn!(namespace = %namespace, document = %document.id, "Write failed: {}", e);
                    report.record_failure(&document.id, e);
                }
            }
        }

        info!(
            namespace = %namespace,
            documents = report.documents,
            succeeded = report.succeeded,
            nodes = report.nodes,
            edges = report.edges,
            "Ingestion finished"
        );
        report
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// Hybrid retrieval. Never fails: any overall failure yields no triples.
    pub async fn retrieve_hybrid(
        &self,
        namespace: &Namespace,
        question: &str,
        options: Option<&HybridOptions>,
    ) -> Vec<Triple> {
        match self.try_retrieve_hybrid(namespace, question, options).await {
            Ok(retrieval) => retrieval.triples,
            Err(e) => {
                warn!(namespace = %namespace, "Hybrid retrieval failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Hybrid retrieval with per-path diagnostics. Fails when both paths
    /// fail or expansion fails.
    pub async fn try_retrieve_hybrid(
        &self,
        namespace: &Namespace,
        question: &str,
        options: Option<&HybridOptions>,
    ) -> GraphResult<HybridRetrieval> {
        let options = options.unwrap_or(&self.defaults);
        let mut retrieval = HybridRetrieval::default();

        if let Some(embedder) = self.resolve_embedding_model(namespace) {
            self.ensure_index_for(namespace, embedder.as_ref()).await;
        }

        let vector_path = with_timeout(
            options.timeout,
            self.retriever.try_search_by_vector(
                namespace,
                question,
                options.vector_score_threshold,
                options.vector_limit,
            ),
        );
        let entity_path = with_timeout(
            options.timeout,
            self.entity_path(namespace, question, options.entity_match_limit),
        );
        let (vector, entity) = tokio::join!(vector_path, entity_path);

        let vector_failed = vector.is_err();
        match vector {
            Ok(anchors) => retrieval.vector_anchors = anchors,
            Err(e) => {
                warn!(namespace = %namespace, "Vector path failed: {}", e);
                retrieval.vector_error = Some(e.to_string());
            }
        }
        match entity {
            Ok((names, anchors)) => {
                retrieval.entity_names = names;
                retrieval.entity_anchors = anchors;
            }
            Err(e) => {
                warn!(namespace = %namespace, "Entity path failed: {}", e);
                retrieval.entity_error = Some(e.to_string());
                if vector_failed {
                    return Err(GraphError::Internal(format!(
                        "both retrieval paths failed (vector: {}; entity: {})",
                        retrieval.vector_error.as_deref().unwrap_or_default(),
                        e
                    )));
                }
            }
        }

        retrieval.anchors = retrieval
            .vector_anchors
            .clone()
            .merge(retrieval.entity_anchors.clone());
        debug!(
            namespace = %namespace,
            vector = retrieval.vector_anchors.len(),
            entity = retrieval.entity_anchors.len(),
            merged = retrieval.anchors.len(),
            "Merged anchors"
        );

        if retrieval.anchors.is_empty() {
            return Ok(retrieval);
        }

        retrieval.triples = self
            .retriever
            .try_expand_subgraph(
                namespace,
                &retrieval.anchors,
                options.hop_depth,
                options.max_triples,
            )
            .await?;
        Ok(retrieval)
    }

    /// Hybrid retrieval followed by one answer call. Nothing found means a
    /// canned answer and no model call.
    pub async fn retrieve_with_answer_hybrid(
        &self,
        namespace: &Namespace,
        question: &str,
        options: Option<&HybridOptions>,
    ) -> GraphAnswer {
        let triples = self.retrieve_hybrid(namespace, question, options).await;
        let Some(context) = GraphRetriever::to_contents(&triples) else {
            return GraphAnswer::not_found();
        };

        let answer = match &self.chat {
            Some(chat) => {
                let mut request = ChatRequest::prompt(prompts::answer_prompt(&context, question));
                if let Some(temperature) = self.temperature {
                    request = request.with_temperature(temperature);
                }
                match chat.chat(request).await {
                    Ok(text) => text.trim().to_string(),
                    Err(e) => {
                        warn!(namespace = %namespace, "Answer generation failed: {}", e);
                        prompts::ANSWER_FAILED.to_string()
                    }
                }
            }
            None => {
                warn!(namespace = %namespace, "No chat model configured, cannot answer");
                prompts::ANSWER_FAILED.to_string()
            }
        };

        GraphAnswer {
            answer,
            triples,
            found: true,
        }
    }

    /// Entity names in `question`, via one chat call. Empty without a chat
    /// model or when the response cannot be parsed.
    pub async fn extract_entity_names(&self, question: &str) -> Vec<String> {
        self.try_extract_entity_names(question)
            .await
            .unwrap_or_else(|e| {
                warn!("Entity name extraction failed: {}", e);
                Vec::new()
            })
    }

    async fn try_extract_entity_names(&self, question: &str) -> GraphResult<Vec<String>> {
        let Some(chat) = &self.chat else {
            debug!("No chat model, entity path disabled");
            return Ok(Vec::new());
        };
        if question.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut request = ChatRequest::prompt(prompts::entity_extraction_prompt(question));
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        let response = chat.chat(request).await?;
        let names = prompts::parse_entity_names(&response);
        debug!("Extracted entity names: {:?}", names);
        Ok(names)
    }

    async fn entity_path(
        &self,
        namespace: &Namespace,
        question: &str,
        limit: usize,
    ) -> GraphResult<(Vec<String>, AnchorSet)> {
        let names = self.try_extract_entity_names(question).await?;
        if names.is_empty() {
            return Ok((names, AnchorSet::new()));
        }
        let anchors = self
            .retriever
            .try_search_by_entity_match(namespace, &names, limit)
            .await?;
        Ok((names, anchors))
    }

    async fn ensure_index_for(&self, namespace: &Namespace, embedder: &dyn EmbeddingProvider) {
        if let Err(e) = self
            .store()
            .ensure_vector_index(namespace, Some(embedder.dimensions()))
            .await
        {
            warn!(namespace = %namespace, "Could not create vector index: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Pass-throughs
    // ------------------------------------------------------------------

    pub async fn statistics(&self, namespace: &Namespace) -> GraphStatistics {
        self.store().statistics(namespace).await
    }

    pub async fn schema(&self, namespace: &Namespace) -> GraphSchema {
        self.store().schema(namespace).await
    }

    pub async fn export(&self, namespace: &Namespace) -> GraphResult<GraphExport> {
        self.store().export(namespace).await
    }

    pub async fn delete_namespace(&self, namespace: &Namespace) -> GraphResult<DeleteSummary> {
        self.store().delete_namespace(namespace).await
    }

    pub async fn delete_document(
        &self,
        namespace: &Namespace,
        document_id: &str,
    ) -> GraphResult<DeleteSummary> {
        self.store().delete_document(namespace, document_id).await
    }

    pub async fn build_query_prompt(&self, namespace: &Namespace) -> String {
        self.retriever.build_query_prompt(namespace).await
    }

    pub async fn is_connected(&self) -> bool {
        self.store().is_connected().await
    }

    pub async fn close(&self) -> GraphResult<()> {
        self.store().close().await
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    future: impl Future<Output = GraphResult<T>>,
) -> GraphResult<T> {
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(GraphError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = HybridOptions::default();
        assert_eq!(options.vector_score_threshold, 0.6);
        assert_eq!(options.vector_limit, 5);
        assert_eq!(options.entity_match_limit, 5);
        assert_eq!(options.hop_depth, 1);
        assert_eq!(options.max_triples, 30);
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_not_found_answer() {
        let answer = GraphAnswer::not_found();
        assert!(!answer.found);
        assert!(answer.triples.is_empty());
        assert_eq!(answer.answer, prompts::NOT_FOUND_ANSWER);
    }
}
