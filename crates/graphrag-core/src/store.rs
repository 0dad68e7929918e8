//! GraphStore: write/admin facade over a [`GraphBackend`]
//!
//! Writes propagate backend errors to the caller. Introspection
//! (`statistics`, `schema`) degrades to empty results.

use crate::error::GraphResult;
use crate::retry::{poll_until, PollOutcome, RetryPolicy};
use crate::traits::GraphBackend;
use crate::types::{
    DeleteSummary, GraphEdge, GraphExport, GraphNode, GraphSchema, GraphStatistics, Namespace,
    SourceDocument, UpsertSummary, VectorIndexSpec,
};
use graphrag_config::VectorIndexConfig;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared handle to a graph backend plus vector index settings
#[derive(Clone)]
pub struct GraphStore {
    backend: Arc<dyn GraphBackend>,
    index_config: VectorIndexConfig,
    ready_policy: RetryPolicy,
    /// (namespace, dimensions) pairs already confirmed ready
    ready: Arc<Mutex<HashSet<(Namespace, usize)>>>,
}

impl GraphStore {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self::with_index_config(backend, VectorIndexConfig::default())
    }

    pub fn with_index_config(backend: Arc<dyn GraphBackend>, index_config: VectorIndexConfig) -> Self {
        Self {
            backend,
            ready_policy: RetryPolicy::from_index_config(&index_config),
            index_config,
            ready: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Override the readiness polling policy
    pub fn with_ready_policy(mut self, policy: RetryPolicy) -> Self {
        self.ready_policy = policy;
        self
    }

    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    pub fn index_config(&self) -> &VectorIndexConfig {
        &self.index_config
    }

    pub async fn upsert_graph(
        &self,
        namespace: &Namespace,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        source: Option<&SourceDocument>,
    ) -> GraphResult<UpsertSummary> {
        match self.backend.upsert_graph(namespace, nodes, edges, source).await {
            Ok(summary) => {
                debug!(
                    namespace = %namespace,
                    nodes = summary.nodes,
                    edges = summary.edges,
                    skipped = summary.edges_skipped,
                    "Upserted graph"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(namespace = %namespace, "Graph upsert failed: {}", e);
                Err(e)
            }
        }
    }

    /// Create the namespace's vector index if absent, then wait for it to be
    /// usable. Returns whether it became ready; not becoming ready is only a
    /// warning, and later vector searches degrade to empty.
    pub async fn ensure_vector_index(
        &self,
        namespace: &Namespace,
        dimensions: Option<usize>,
    ) -> GraphResult<bool> {
        let dimensions = dimensions.unwrap_or(self.index_config.default_dimensions);
        let key = (namespace.clone(), dimensions);
        if self.ready.lock().contains(&key) {
            return Ok(true);
        }

        let spec = VectorIndexSpec {
            dimensions,
            similarity: self.index_config.similarity,
        };
        self.backend.create_vector_index(namespace, &spec).await?;

        let backend = &self.backend;
        match poll_until(&self.ready_policy, || backend.vector_index_ready(namespace)).await {
            PollOutcome::Ready { attempts } => {
                debug!(namespace = %namespace, attempts, "Vector index ready");
                self.ready.lock().insert(key);
                Ok(true)
            }
            PollOutcome::Exhausted { attempts } => {
                warn!(
                    namespace = %namespace,
                    attempts,
                    "Vector index {} not ready, vector search may return nothing",
                    namespace.index_name()
                );
                Ok(false)
            }
        }
    }

    pub async fn vector_index_ready(&self, namespace: &Namespace) -> GraphResult<bool> {
        self.backend.vector_index_ready(namespace).await
    }

    /// Wipe the namespace, including its vector index
    pub async fn delete_namespace(&self, namespace: &Namespace) -> GraphResult<DeleteSummary> {
        self.ready.lock().retain(|(ns, _)| ns != namespace);
        let summary = self.backend.delete_namespace(namespace).await?;
        info!(
            namespace = %namespace,
            entities = summary.entities,
            documents = summary.documents,
            "Deleted namespace"
        );
        Ok(summary)
    }

    /// Remove one document and the entities only it mentioned
    pub async fn delete_document(
        &self,
        namespace: &Namespace,
        document_id: &str,
    ) -> GraphResult<DeleteSummary> {
        let summary = self.backend.delete_document(namespace, document_id).await?;
        info!(
            namespace = %namespace,
            document = document_id,
            orphans = summary.entities,
            "Deleted document"
        );
        Ok(summary)
    }

    pub async fn statistics(&self, namespace: &Namespace) -> GraphStatistics {
        self.backend.statistics(namespace).await.unwrap_or_else(|e| {
            warn!(namespace = %namespace, "Statistics unavailable: {}", e);
            GraphStatistics::empty(namespace)
        })
    }

    pub async fn schema(&self, namespace: &Namespace) -> GraphSchema {
        self.backend.schema(namespace).await.unwrap_or_else(|e| {
            warn!(namespace = %namespace, "Schema unavailable: {}", e);
            GraphSchema::default()
        })
    }

    pub async fn export(&self, namespace: &Namespace) -> GraphResult<GraphExport> {
        self.backend.export(namespace).await
    }

    pub async fn is_connected(&self) -> bool {
        self.backend.is_connected().await
    }

    pub async fn close(&self) -> GraphResult<()> {
        self.backend.close().await
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("backend", &self.backend.backend_name())
            .field("index_config", &self.index_config)
            .finish()
    }
}
