//! Process-local graph backend
//!
//! Keeps every namespace in a `BTreeMap`-based graph behind one `RwLock`.
//! Used for tests and ephemeral runs (`backend = "memory"`); nothing is persisted.

use crate::error::{GraphError, GraphResult};
use crate::traits::GraphBackend;
use crate::types::{
    push_unique_triple, DeleteSummary, GraphEdge, GraphExport, GraphNode, GraphSchema,
    GraphStatistics, MatchMode, Namespace, SchemaPattern, ScoredNode, SourceDocument, Triple,
    UpsertSummary, VectorIndexSpec,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graphrag_config::SimilarityFunction;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

type EntityKey = (String, String); // (node_type, name)
type EdgeKey = (String, String, String); // (source, relation, target)

#[derive(Debug, Clone)]
struct StoredEntity {
    description: String,
    embedding: Option<Vec<f32>>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredEdge {
    source_type: String,
    target_type: String,
    description: String,
    strength: Option<f32>,
}

#[derive(Debug, Default)]
struct NamespaceGraph {
    entities: BTreeMap<EntityKey, StoredEntity>,
    edges: BTreeMap<EdgeKey, StoredEdge>,
    documents: BTreeSet<String>,
    /// (document id, node_type, name)
    mentions: BTreeSet<(String, String, String)>,
    index: Option<VectorIndexSpec>,
}

impl NamespaceGraph {
    /// Type of an existing entity called `name`, preferring `hint`
    fn entity_type(&self, name: &str, hint: Option<&str>) -> Option<String> {
        if let Some(hint) = hint {
            if self.entities.contains_key(&(hint.to_string(), name.to_string())) {
                return Some(hint.to_string());
            }
        }
        self.entities
            .keys()
            .find(|(_, n)| n == name)
            .map(|(t, _)| t.clone())
    }

    fn has_name(&self, name: &str) -> bool {
        self.entities.keys().any(|(_, n)| n == name)
    }

    fn is_mentioned(&self, key: &EntityKey) -> bool {
        self.mentions
            .iter()
            .any(|(_, t, n)| t == &key.0 && n == &key.1)
    }

    /// Edges touching `name`, in key order
    fn edges_touching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EdgeKey> + 'a {
        self.edges
            .keys()
            .filter(move |(s, _, t)| s == name || t == name)
    }
}

/// In-memory [`GraphBackend`]
#[derive(Debug, Default)]
pub struct InMemoryGraphBackend {
    graphs: RwLock<HashMap<Namespace, NamespaceGraph>>,
    closed: AtomicBool,
}

impl InMemoryGraphBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self) -> GraphResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(GraphError::Connection("backend is closed".to_string()));
        }
        Ok(())
    }

    /// `(created, updated)` of an entity, if stored
    pub fn entity_timestamps(
        &self,
        namespace: &Namespace,
        node_type: &str,
        name: &str,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let graphs = self.graphs.read();
        let entity = graphs
            .get(namespace)?
            .entities
            .get(&(node_type.to_string(), name.to_string()))?;
        Some((entity.created, entity.updated))
    }
}

#[async_trait]
impl GraphBackend for InMemoryGraphBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn upsert_graph(
        &self,
        namespace: &Namespace,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        source: Option<&SourceDocument>,
    ) -> GraphResult<UpsertSummary> {
        self.check_open()?;
        let now = Utc::now();
        let mut graphs = self.graphs.write();
        let graph = graphs.entry(namespace.clone()).or_default();
        let mut summary = UpsertSummary::default();

        for node in nodes {
            let key = (node.node_type.clone(), node.id.clone());
            let created = graph.entities.get(&key).map(|e| e.created).unwrap_or(now);
            graph.entities.insert(
                key,
                StoredEntity {
                    description: node.description.clone(),
                    embedding: node.embedding.clone(),
                    created,
                    updated: now,
                },
            );
            summary.nodes += 1;
        }

        for edge in edges {
            let source_type = graph.entity_type(&edge.source, edge.source_type.as_deref());
            let target_type = graph.entity_type(&edge.target, edge.target_type.as_deref());
            let (Some(source_type), Some(target_type)) = (source_type, target_type) else {
                debug!(
                    namespace = %namespace,
                    "Skipping edge with missing endpoint: {} -> {}",
                    edge.source, edge.target
                );
                summary.edges_skipped += 1;
                continue;
            };
            let key = (edge.source.clone(), edge.relation.clone(), edge.target.clone());
            graph.edges.insert(
                key,
                StoredEdge {
                    source_type,
                    target_type,
                    description: edge.description.clone(),
                    strength: edge.strength,
                },
            );
            summary.edges += 1;
        }

        if let Some(document) = source {
            graph.documents.insert(document.id.clone());
            for node in nodes {
                graph.mentions.insert((
                    document.id.clone(),
                    node.node_type.clone(),
                    node.id.clone(),
                ));
                summary.mentions += 1;
            }
        }

        Ok(summary)
    }

    async fn create_vector_index(
        &self,
        namespace: &Namespace,
        spec: &VectorIndexSpec,
    ) -> GraphResult<()> {
        self.check_open()?;
        let mut graphs = self.graphs.write();
        let graph = graphs.entry(namespace.clone()).or_default();
        match &graph.index {
            Some(existing) if existing.dimensions != spec.dimensions => {
                warn!(
                    namespace = %namespace,
                    "Vector index already exists with {} dimensions, requested {}",
                    existing.dimensions, spec.dimensions
                );
            }
            Some(_) => {}
            None => graph.index = Some(*spec),
        }
        Ok(())
    }

    async fn vector_index_ready(&self, namespace: &Namespace) -> GraphResult<bool> {
        self.check_open()?;
        Ok(self
            .graphs
            .read()
            .get(namespace)
            .is_some_and(|g| g.index.is_some()))
    }

    async fn vector_search(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        limit: usize,
        similarity: SimilarityFunction,
    ) -> GraphResult<Vec<ScoredNode>> {
        self.check_open()?;
        let graphs = self.graphs.read();
        let Some(graph) = graphs.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<ScoredNode> = graph
            .entities
            .iter()
            .filter_map(|((node_type, name), entity)| {
                let embedding = entity.embedding.as_ref()?;
                (embedding.len() == vector.len()).then(|| ScoredNode {
                    id: name.clone(),
                    node_type: node_type.clone(),
                    score: similarity.score(vector, embedding),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn match_entities(
        &self,
        namespace: &Namespace,
        name: &str,
        mode: MatchMode,
        limit: usize,
    ) -> GraphResult<Vec<String>> {
        self.check_open()?;
        let graphs = self.graphs.read();
        let Some(graph) = graphs.get(namespace) else {
            return Ok(Vec::new());
        };
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut names: Vec<&String> = graph
            .entities
            .keys()
            .map(|(_, n)| n)
            .filter(|n| {
                let candidate = n.to_lowercase();
                match mode {
                    MatchMode::Exact => candidate == needle,
                    MatchMode::Fuzzy => candidate.contains(&needle),
                }
            })
            .collect();
        names.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        names.dedup();
        Ok(names.into_iter().take(limit).cloned().collect())
    }

    async fn expand(
        &self,
        namespace: &Namespace,
        anchors: &[String],
        hop_depth: u8,
        limit: usize,
    ) -> GraphResult<Vec<Triple>> {
        self.check_open()?;
        let graphs = self.graphs.read();
        let Some(graph) = graphs.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut triples = Vec::new();
        let mut seen = HashSet::new();
        let mut neighbors: Vec<&str> = Vec::new();
        let anchor_set: HashSet<&str> = anchors.iter().map(String::as_str).collect();

        for anchor in anchors {
            for (source, relation, target) in graph.edges_touching(anchor) {
                if triples.len() >= limit {
                    return Ok(triples);
                }
                push_unique_triple(
                    &mut triples,
                    &mut seen,
                    Triple::new(source.as_str(), relation.as_str(), target.as_str()),
                );
                let other = if source == anchor { target } else { source };
                if !anchor_set.contains(other.as_str()) && !neighbors.contains(&other.as_str()) {
                    neighbors.push(other.as_str());
                }
            }
        }

        if hop_depth >= 2 {
            for neighbor in neighbors {
                for (source, relation, target) in graph.edges_touching(neighbor) {
                    if triples.len() >= limit {
                        return Ok(triples);
                    }
                    push_unique_triple(
                        &mut triples,
                        &mut seen,
                        Triple::new(source.as_str(), relation.as_str(), target.as_str()),
                    );
                }
            }
        }

        triples.truncate(limit);
        Ok(triples)
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> GraphResult<DeleteSummary> {
        self.check_open()?;
        let removed = self.graphs.write().remove(namespace);
        Ok(removed
            .map(|g| DeleteSummary {
                documents: g.documents.len(),
                entities: g.entities.len(),
                edges: g.edges.len(),
            })
            .unwrap_or_default())
    }

    async fn delete_document(
        &self,
        namespace: &Namespace,
        document_id: &str,
    ) -> GraphResult<DeleteSummary> {
        self.check_open()?;
        let mut graphs = self.graphs.write();
        let Some(graph) = graphs.get_mut(namespace) else {
            return Ok(DeleteSummary::default());
        };
        let mut summary = DeleteSummary::default();
        if graph.documents.remove(document_id) {
            summary.documents = 1;
        }

        let mentioned: Vec<EntityKey> = graph
            .mentions
            .iter()
            .filter(|(doc, _, _)| doc == document_id)
            .map(|(_, t, n)| (t.clone(), n.clone()))
            .collect();
        graph.mentions.retain(|(doc, _, _)| doc != document_id);

        for key in mentioned {
            if graph.is_mentioned(&key) {
                continue;
            }
            if graph.entities.remove(&key).is_some() {
                summary.entities += 1;
            }
            if !graph.has_name(&key.1) {
                let before = graph.edges.len();
                graph
                    .edges
                    .retain(|(s, _, t), _| s != &key.1 && t != &key.1);
                summary.edges += before - graph.edges.len();
            }
        }
        Ok(summary)
    }

    async fn statistics(&self, namespace: &Namespace) -> GraphResult<GraphStatistics> {
        self.check_open()?;
        let graphs = self.graphs.read();
        let Some(graph) = graphs.get(namespace) else {
            return Ok(GraphStatistics::empty(namespace));
        };
        let mut stats = GraphStatistics::empty(namespace);
        stats.nodes = graph.entities.len();
        stats.edges = graph.edges.len();
        stats.documents = graph.documents.len();
        stats.vector_index = graph.index.is_some();
        for ((node_type, _), entity) in &graph.entities {
            *stats.node_types.entry(node_type.clone()).or_default() += 1;
            if entity.embedding.is_some() {
                stats.embedded_nodes += 1;
            }
        }
        for (_, relation, _) in graph.edges.keys() {
            *stats.relation_types.entry(relation.clone()).or_default() += 1;
        }
        Ok(stats)
    }

    async fn schema(&self, namespace: &Namespace) -> GraphResult<GraphSchema> {
        self.check_open()?;
        let graphs = self.graphs.read();
        let Some(graph) = graphs.get(namespace) else {
            return Ok(GraphSchema::default());
        };
        let labels: BTreeSet<String> = graph.entities.keys().map(|(t, _)| t.clone()).collect();
        let relations: BTreeSet<String> =
            graph.edges.keys().map(|(_, r, _)| r.clone()).collect();
        let patterns: BTreeSet<SchemaPattern> = graph
            .edges
            .iter()
            .map(|((_, relation, _), edge)| SchemaPattern {
                source_type: edge.source_type.clone(),
                relation: relation.clone(),
                target_type: edge.target_type.clone(),
            })
            .collect();
        Ok(GraphSchema {
            node_labels: labels.into_iter().collect(),
            relation_types: relations.into_iter().collect(),
            patterns: patterns.into_iter().collect(),
        })
    }

    async fn export(&self, namespace: &Namespace) -> GraphResult<GraphExport> {
        self.check_open()?;
        let graphs = self.graphs.read();
        let mut export = GraphExport {
            namespace: namespace.to_string(),
            ..Default::default()
        };
        let Some(graph) = graphs.get(namespace) else {
            return Ok(export);
        };
        export.nodes = graph
            .entities
            .iter()
            .map(|((node_type, name), entity)| {
                GraphNode::new(name.as_str(), node_type.as_str())
                    .with_description(entity.description.as_str())
            })
            .collect();
        export.edges = graph
            .edges
            .iter()
            .map(|((source, relation, target), edge)| GraphEdge {
                source: source.clone(),
                source_type: Some(edge.source_type.clone()),
                relation: relation.clone(),
                target: target.clone(),
                target_type: Some(edge.target_type.clone()),
                description: edge.description.clone(),
                strength: edge.strength,
            })
            .collect();
        Ok(export)
    }

    async fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> GraphResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(id: &str) -> Namespace {
        Namespace::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_timestamps_survive_reupsert() {
        let backend = InMemoryGraphBackend::new();
        let kb = ns("kb");
        let node = GraphNode::new("OPENAI", "ORGANIZATION").with_description("v1");
        backend.upsert_graph(&kb, &[node.clone()], &[], None).await.unwrap();
        let (created, _) = backend
            .entity_timestamps(&kb, "ORGANIZATION", "OPENAI")
            .unwrap();

        let node = node.with_description("v2");
        backend.upsert_graph(&kb, &[node], &[], None).await.unwrap();
        let (created_again, updated) = backend
            .entity_timestamps(&kb, "ORGANIZATION", "OPENAI")
            .unwrap();
        assert_eq!(created_again, created);
        assert!(updated >= created);
        let export = backend.export(&kb).await.unwrap();
        assert_eq!(export.nodes[0].description, "v2");
    }

    #[tokio::test]
    async fn test_vector_search_uses_requested_similarity() {
        let backend = InMemoryGraphBackend::new();
        let kb = ns("kb");
        let nodes = [
            GraphNode::new("FAR", "POINT").with_embedding(vec![10.0, 0.0]),
            GraphNode::new("NEAR", "POINT").with_embedding(vec![0.8, 0.6]),
        ];
        backend.upsert_graph(&kb, &nodes, &[], None).await.unwrap();

        let cosine = backend
            .vector_search(&kb, &[1.0, 0.0], 2, SimilarityFunction::Cosine)
            .await
            .unwrap();
        assert_eq!(cosine[0].id, "FAR");

        let euclidean = backend
            .vector_search(&kb, &[1.0, 0.0], 2, SimilarityFunction::Euclidean)
            .await
            .unwrap();
        assert_eq!(euclidean[0].id, "NEAR");
        assert!(euclidean[1].score < 0.2);
    }

    #[tokio::test]
    async fn test_closed_backend_rejects_calls() {
        let backend = InMemoryGraphBackend::new();
        assert!(backend.is_connected().await);
        backend.close().await.unwrap();
        assert!(!backend.is_connected().await);
        let err = backend.statistics(&ns("kb")).await.unwrap_err();
        assert!(matches!(err, GraphError::Connection(_)));
    }

    #[tokio::test]
    async fn test_fuzzy_match_prefers_shorter_names() {
        let backend = InMemoryGraphBackend::new();
        let kb = ns("kb");
        backend
            .upsert_graph(
                &kb,
                &[
                    GraphNode::new("OPENAI FOUNDATION", "ORGANIZATION"),
                    GraphNode::new("OPENAI", "ORGANIZATION"),
                    GraphNode::new("OPENAI", "PRODUCT"),
                ],
                &[],
                None,
            )
            .await
            .unwrap();
        let fuzzy = backend
            .match_entities(&kb, "openai", MatchMode::Fuzzy, 5)
            .await
            .unwrap();
        assert_eq!(fuzzy, vec!["OPENAI", "OPENAI FOUNDATION"]);
    }
}
