//! Graph domain types shared by every backend and the retrieval engine

use crate::error::{GraphError, GraphResult};
use graphrag_config::SimilarityFunction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

const SLUG_MAX_LEN: usize = 32;

/// Knowledge-base namespace. Every node, edge, document and vector index is
/// scoped by one, and it is always passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace; blank ids are rejected
    pub fn new(id: impl Into<String>) -> GraphResult<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(GraphError::InvalidInput(
                "namespace must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier-safe form of the namespace: `[a-z0-9_]` only, suffixed with
    /// a short hash of the raw id so that `a-b` and `a_b` stay distinct.
    pub fn storage_slug(&self) -> String {
        let mut slug: String = self
            .0
            .chars()
            .map(|c| {
                let c = c.to_ascii_lowercase();
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '_'
                }
            })
            .take(SLUG_MAX_LEN)
            .collect();
        let digest = hex::encode(Sha256::digest(self.0.as_bytes()));
        slug.push('_');
        slug.push_str(&digest[..8]);
        slug
    }

    /// Name of the per-namespace embedding table
    pub fn embedding_table(&self) -> String {
        format!("emb_{}", self.storage_slug())
    }

    /// Name of the per-namespace vector index
    pub fn index_name(&self) -> String {
        format!("{}_vec", self.embedding_table())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Namespace::new(value)
    }
}

impl TryFrom<&str> for Namespace {
    type Error = GraphError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Namespace::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

/// An extracted entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Entity surface name, unique within namespace + type
    pub id: String,
    /// Type label, e.g. `PERSON`
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            description: String::new(),
            embedding: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// An extracted relationship between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Free-form relation text; may contain any characters
    #[serde(rename = "type")]
    pub relation: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_type: None,
            relation: relation.into(),
            target: target.into(),
            target_type: None,
            description: String::new(),
            strength: None,
        }
    }

    pub fn with_types(mut self, source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self.target_type = Some(target_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// The `(source, relation, target)` key edges are merged on
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.source, &self.relation, &self.target)
    }
}

/// Provenance text for one extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// SHA-256 hex digest of `text`
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SourceDocument {
    /// Create a document whose id is derived from its text, so identical
    /// text always maps to the same document node
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: document_id(&text),
            text,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Deterministic document id: SHA-256 hex of the text
pub fn document_id(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// One extraction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub source: SourceDocument,
}

impl GraphDocument {
    pub fn new(source: SourceDocument) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            source,
        }
    }
}

/// A head-relation-tail fact handed to the language model as context
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Triple {
    pub fn new(head: impl Into<String>, relation: impl Into<String>, tail: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }

    /// Whether either end of the triple is `name` (case-insensitive)
    pub fn mentions(&self, name: &str) -> bool {
        self.head.eq_ignore_ascii_case(name) || self.tail.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) --[{}]--> ({})", self.head, self.relation, self.tail)
    }
}

/// Append `triple` unless it is already present
pub fn push_unique_triple(triples: &mut Vec<Triple>, seen: &mut HashSet<Triple>, triple: Triple) {
    if seen.insert(triple.clone()) {
        triples.push(triple);
    }
}

/// Ordered, de-duplicated node ids. Union keeps first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AnchorSet {
    ids: Vec<String>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id; returns false when it was already present
    pub fn push(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.ids.push(id);
        true
    }

    /// Append every id of `other` not already present
    pub fn merge(mut self, other: AnchorSet) -> AnchorSet {
        self.extend(other.ids);
        self
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.ids.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ids
    }
}

impl Extend<String> for AnchorSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for id in iter {
            self.push(id);
        }
    }
}

impl FromIterator<String> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = AnchorSet::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<String>> for AnchorSet {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<AnchorSet> for Vec<String> {
    fn from(set: AnchorSet) -> Self {
        set.ids
    }
}

/// A vector search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNode {
    pub id: String,
    pub node_type: String,
    /// Similarity in [0, 1] for cosine, higher is closer
    pub score: f32,
}

/// How `match_entities` compares names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive equality
    Exact,
    /// Case-insensitive substring
    Fuzzy,
}

/// Shape of a namespace's vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorIndexSpec {
    pub dimensions: usize,
    pub similarity: SimilarityFunction,
}

/// Counts and distributions for one namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub namespace: String,
    pub nodes: usize,
    pub edges: usize,
    pub documents: usize,
    pub embedded_nodes: usize,
    pub node_types: BTreeMap<String, usize>,
    pub relation_types: BTreeMap<String, usize>,
    pub vector_index: bool,
}

impl GraphStatistics {
    pub fn empty(namespace: &Namespace) -> Self {
        Self {
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }
}

/// An observed `(source_type)-[relation]->(target_type)` combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaPattern {
    pub source_type: String,
    pub relation: String,
    pub target_type: String,
}

/// Inferred schema of a namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    pub node_labels: Vec<String>,
    pub relation_types: Vec<String>,
    pub patterns: Vec<SchemaPattern>,
}

impl GraphSchema {
    pub fn is_empty(&self) -> bool {
        self.node_labels.is_empty() && self.relation_types.is_empty()
    }

    /// Render the schema for inclusion in a prompt
    pub fn to_prompt_text(&self) -> String {
        if self.is_empty() {
            return "The graph is empty.".to_string();
        }
        let mut out = String::new();
        out.push_str("Node labels: ");
        out.push_str(&self.node_labels.join(", "));
        out.push('\n');
        out.push_str("Relationship types: ");
        out.push_str(
            &self
                .relation_types
                .iter()
                .map(|r| format!("\"{}\"", r))
                .collect::<Vec<_>>()
                .join(", "),
        );
        out.push('\n');
        if !self.patterns.is_empty() {
            out.push_str("Patterns:\n");
            for p in &self.patterns {
                out.push_str(&format!(
                    "(:{})-[:\"{}\"]->(:{})\n",
                    p.source_type, p.relation, p.target_type
                ));
            }
        }
        out
    }
}

/// Whole-namespace dump for external visualization. Nodes carry no embeddings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub namespace: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Counters reported by `upsert_graph`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Edges whose endpoints were not present in the namespace
    pub edges_skipped: usize,
    pub mentions: usize,
}

/// Counters reported by deletes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub documents: usize,
    pub entities: usize,
    pub edges: usize,
}

/// One document that failed during batch ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionFailure {
    pub document_id: String,
    pub error: String,
}

/// Aggregate outcome of `process_documents`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub documents: usize,
    pub succeeded: usize,
    pub nodes: usize,
    pub edges: usize,
    pub edges_skipped: usize,
    pub failures: Vec<IngestionFailure>,
}

impl IngestionReport {
    pub fn record(&mut self, summary: &UpsertSummary) {
        self.succeeded += 1;
        self.nodes += summary.nodes;
        self.edges += summary.edges;
        self.edges_skipped += summary.edges_skipped;
    }

    pub fn record_failure(&mut self, document_id: impl Into<String>, error: impl fmt::Display) {
        self.failures.push(IngestionFailure {
            document_id: document_id.into(),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_rejects_blank() {
        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("   ").is_err());
        assert_eq!(Namespace::new(" kb1 ").unwrap().as_str(), "kb1");
    }

    #[test]
    fn test_storage_slug_is_identifier_safe() {
        let ns = Namespace::new("Company Wiki/2024; DROP").unwrap();
        let slug = ns.storage_slug();
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        assert!(slug.starts_with("company_wiki_2024__drop_"));
        assert_eq!(ns.index_name(), format!("emb_{}_vec", slug));
    }

    #[test]
    fn test_storage_slug_distinguishes_similar_ids() {
        let a = Namespace::new("a-b").unwrap();
        let b = Namespace::new("a_b").unwrap();
        assert_ne!(a.storage_slug(), b.storage_slug());
        assert_eq!(a.storage_slug(), Namespace::new("a-b").unwrap().storage_slug());
    }

    #[test]
    fn test_document_id_is_sha256_of_text() {
        let doc = SourceDocument::new("hello");
        assert_eq!(
            doc.id,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(SourceDocument::new("hello").id, doc.id);
    }

    #[test]
    fn test_triple_display() {
        let t = Triple::new("SAM ALTMAN", "CEO of", "OPENAI");
        assert_eq!(t.to_string(), "(SAM ALTMAN) --[CEO of]--> (OPENAI)");
        assert!(t.mentions("openai"));
    }

    #[test]
    fn test_anchor_merge_preserves_first_seen_order() {
        let vector: AnchorSet = vec!["v1".to_string(), "v2".to_string()].into();
        let entity: AnchorSet = vec!["v2".to_string(), "e1".to_string()].into();
        let merged = vector.merge(entity);
        assert_eq!(merged.as_slice(), &["v1", "v2", "e1"]);
    }

    #[test]
    fn test_anchor_set_serde_roundtrip_keeps_dedup() {
        let json = r#"["a","b","a"]"#;
        let set: AnchorSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("b"));
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_schema_prompt_text() {
        let schema = GraphSchema {
            node_labels: vec!["ORGANIZATION".into(), "PERSON".into()],
            relation_types: vec!["CEO of".into()],
            patterns: vec![SchemaPattern {
                source_type: "PERSON".into(),
                relation: "CEO of".into(),
                target_type: "ORGANIZATION".into(),
            }],
        };
        let text = schema.to_prompt_text();
        assert!(text.contains("Node labels: ORGANIZATION, PERSON"));
        assert!(text.contains("(:PERSON)-[:\"CEO of\"]->(:ORGANIZATION)"));
        assert_eq!(GraphSchema::default().to_prompt_text(), "The graph is empty.");
    }

    #[test]
    fn test_graph_node_json_shape() {
        let node: GraphNode =
            serde_json::from_str(r#"{"id":"OpenAI","type":"ORGANIZATION"}"#).unwrap();
        assert_eq!(node.node_type, "ORGANIZATION");
        assert!(node.description.is_empty());
        assert!(node.embedding.is_none());
    }
}
