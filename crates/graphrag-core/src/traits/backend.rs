//! Graph storage abstraction
//!
//! Every operation takes the namespace explicitly. Backends never read or
//! write across namespaces.

use crate::error::GraphResult;
use crate::types::{
    DeleteSummary, GraphEdge, GraphExport, GraphNode, GraphSchema, GraphStatistics, MatchMode,
    Namespace, ScoredNode, SourceDocument, Triple, UpsertSummary, VectorIndexSpec,
};
use async_trait::async_trait;
use graphrag_config::SimilarityFunction;

/// Graph database backend
///
/// ## Write semantics
///
/// `upsert_graph` merges nodes by `(namespace, type, id)` and edges by
/// `(namespace, source, relation, target)`. Running it twice with the same
/// input leaves the same graph. Edges whose endpoints are missing are
/// skipped and counted in the returned summary.
///
/// ## Thread Safety
///
/// Implementations must be Send + Sync; they are shared behind `Arc`.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Short backend name for logs (`surrealdb`, `memory`)
    fn backend_name(&self) -> &'static str;

    /// Merge nodes, then edges, then the source document and its `MENTIONS` links
    async fn upsert_graph(
        &self,
        namespace: &Namespace,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        source: Option<&SourceDocument>,
    ) -> GraphResult<UpsertSummary>;

    /// Create the namespace's vector index if it does not exist. Must be
    /// idempotent under concurrent callers.
    async fn create_vector_index(
        &self,
        namespace: &Namespace,
        spec: &VectorIndexSpec,
    ) -> GraphResult<()>;

    /// Whether the namespace's vector index exists and can serve queries
    async fn vector_index_ready(&self, namespace: &Namespace) -> GraphResult<bool>;

    /// Nearest nodes to `vector`, ordered by descending score as computed
    /// by `similarity`
    async fn vector_search(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        limit: usize,
        similarity: SimilarityFunction,
    ) -> GraphResult<Vec<ScoredNode>>;

    /// Entity names matching `name` case-insensitively. Document nodes never match.
    async fn match_entities(
        &self,
        namespace: &Namespace,
        name: &str,
        mode: MatchMode,
        limit: usize,
    ) -> GraphResult<Vec<String>>;

    /// Triples reachable from `anchors` within `hop_depth` relationships,
    /// de-duplicated and capped at `limit`
    async fn expand(
        &self,
        namespace: &Namespace,
        anchors: &[String],
        hop_depth: u8,
        limit: usize,
    ) -> GraphResult<Vec<Triple>>;

    /// Remove everything in the namespace, including its vector index
    async fn delete_namespace(&self, namespace: &Namespace) -> GraphResult<DeleteSummary>;

    /// Remove a document, its `MENTIONS` links and every entity no other
    /// document still mentions
    async fn delete_document(
        &self,
        namespace: &Namespace,
        document_id: &str,
    ) -> GraphResult<DeleteSummary>;

    async fn statistics(&self, namespace: &Namespace) -> GraphResult<GraphStatistics>;

    async fn schema(&self, namespace: &Namespace) -> GraphResult<GraphSchema>;

    async fn export(&self, namespace: &Namespace) -> GraphResult<GraphExport>;

    /// Liveness probe
    async fn is_connected(&self) -> bool;

    /// Graceful shutdown. Later calls fail with a connection error.
    async fn close(&self) -> GraphResult<()>;
}
