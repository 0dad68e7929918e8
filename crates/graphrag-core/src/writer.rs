//! GraphWriter: turns raw extraction output into idempotent upserts
//!
//! No retrieval logic lives here. `prepare` is pure normalization;
//! `write` adds embeddings and hands the batch to the [`GraphStore`].

use crate::error::{GraphError, GraphResult};
use crate::store::GraphStore;
use crate::traits::EmbeddingProvider;
use crate::types::{GraphDocument, GraphEdge, GraphNode, Namespace, UpsertSummary};
use graphrag_config::{ExtractionConfig, FALLBACK_NODE_TYPE};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Nodes and edges after normalization and in-batch de-duplication
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Clone, Debug)]
pub struct GraphWriter {
    store: GraphStore,
    allowed_types: Option<HashSet<String>>,
}

impl GraphWriter {
    /// Writer that accepts any node type
    pub fn new(store: GraphStore) -> Self {
        Self {
            store,
            allowed_types: None,
        }
    }

    /// Restrict node types; anything else becomes [`FALLBACK_NODE_TYPE`]
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = types
            .into_iter()
            .map(|t| normalize_label(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        self.allowed_types = (!allowed.is_empty()).then_some(allowed);
        self
    }

    pub fn from_config(store: GraphStore, config: &ExtractionConfig) -> Self {
        Self::new(store).with_allowed_types(&config.allowed_node_types)
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Normalize and de-duplicate one extraction result
    pub fn prepare(&self, document: &GraphDocument) -> PreparedGraph {
        let mut node_index: HashMap<(String, String), usize> = HashMap::new();
        let mut nodes: Vec<GraphNode> = Vec::new();
        for raw in &document.nodes {
            let id = normalize_identifier(&raw.id);
            if id.is_empty() {
                continue;
            }
            let node = GraphNode {
                node_type: self.resolve_type(&raw.node_type),
                id,
                description: raw.description.trim().to_string(),
                embedding: raw.embedding.clone(),
            };
            let key = (node.node_type.clone(), node.id.clone());
            match node_index.get(&key) {
                Some(&i) => nodes[i] = node,
                None => {
                    node_index.insert(key, nodes.len());
                    nodes.push(node);
                }
            }
        }

        let mut edge_index: HashMap<(String, String, String), usize> = HashMap::new();
        let mut edges: Vec<GraphEdge> = Vec::new();
        for raw in &document.edges {
            let source = normalize_identifier(&raw.source);
            let target = normalize_identifier(&raw.target);
            let relation = raw.relation.trim().to_string();
            if source.is_empty() || target.is_empty() || relation.is_empty() {
                continue;
            }
            let edge = GraphEdge {
                source_type: raw.source_type.as_deref().map(|t| self.resolve_type(t)),
                target_type: raw.target_type.as_deref().map(|t| self.resolve_type(t)),
                source,
                relation,
                target,
                description: raw.description.trim().to_string(),
                strength: raw.strength,
            };
            let key = (edge.source.clone(), edge.relation.clone(), edge.target.clone());
            match edge_index.get(&key) {
                Some(&i) => edges[i] = edge,
                None => {
                    edge_index.insert(key, edges.len());
                    edges.push(edge);
                }
            }
        }

        PreparedGraph { nodes, edges }
    }

    /// Normalize, optionally embed, and upsert one extraction result.
    ///
    /// An embedding failure fails the whole document.
    pub async fn write(
        &self,
        namespace: &Namespace,
        document: &GraphDocument,
        embedder: Option<&dyn EmbeddingProvider>,
        include_source: bool,
    ) -> GraphResult<UpsertSummary> {
        let mut prepared = self.prepare(document);

        if let Some(embedder) = embedder {
            if !prepared.nodes.is_empty() {
                attach_embeddings(&mut prepared.nodes, embedder).await?;
            }
        }

        let source = include_source.then_some(&document.source);
        self.store
            .upsert_graph(namespace, &prepared.nodes, &prepared.edges, source)
            .await
    }

    fn resolve_type(&self, raw: &str) -> String {
        let label = normalize_label(raw);
        match &self.allowed_types {
            _ if label.is_empty() => FALLBACK_NODE_TYPE.to_string(),
            Some(allowed) if !allowed.contains(&label) => FALLBACK_NODE_TYPE.to_string(),
            _ => label,
        }
    }
}

async fn attach_embeddings(
    nodes: &mut [GraphNode],
    embedder: &dyn EmbeddingProvider,
) -> GraphResult<()> {
    let texts: Vec<String> = nodes.iter().map(embedding_text).collect();
    let responses = embedder.embed_batch(texts).await?;
    if responses.len() != nodes.len() {
        return Err(GraphError::Extraction(format!(
            "embedding provider returned {} vectors for {} nodes",
            responses.len(),
            nodes.len()
        )));
    }
    debug!(
        "Embedded {} nodes with {}",
        nodes.len(),
        embedder.model_name()
    );
    for (node, response) in nodes.iter_mut().zip(responses) {
        node.embedding = Some(response.embedding);
    }
    Ok(())
}

/// Text embedded for a node: `"{type}: {id}\n{description}"`
pub fn embedding_text(node: &GraphNode) -> String {
    format!("{}: {}\n{}", node.node_type, node.id, node.description)
}

/// Trim, collapse internal whitespace and upper-case an entity name
pub fn normalize_identifier(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Upper-cased type label with whitespace replaced by underscores
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}
