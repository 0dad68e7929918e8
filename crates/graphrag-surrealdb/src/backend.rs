//! [`GraphBackend`] on embedded SurrealDB
//!
//! Layout: shared `entity`, `relation`, `document` and `mentions` tables,
//! every row tagged with `ns` and keyed by a composite `[ns, ...]` record
//! id, plus one `emb_<slug>` table per namespace holding node embeddings
//! under an MTREE index.

use crate::client::{take_count, take_rows, SurrealClient};
use crate::error::StoreError;
use crate::queries;
use crate::schema::apply_graph_schema;
use async_trait::async_trait;
use graphrag_config::{SimilarityFunction, StorageConfig};
use graphrag_core::types::push_unique_triple;
use graphrag_core::{
    DeleteSummary, GraphBackend, GraphEdge, GraphExport, GraphNode, GraphResult, GraphSchema,
    GraphStatistics, MatchMode, Namespace, SchemaPattern, ScoredNode, SourceDocument, Triple,
    UpsertSummary, VectorIndexSpec,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct NameRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TypeRow {
    node_type: String,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    source: String,
    relation: String,
    target: String,
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    name: String,
    node_type: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct TypeCountRow {
    node_type: String,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct RelationCountRow {
    relation: String,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct PatternRow {
    source_type: String,
    relation: String,
    target_type: String,
}

#[derive(Debug, Deserialize)]
struct EntityRow {
    name: String,
    node_type: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RelationRow {
    source: String,
    source_type: String,
    relation: String,
    target: String,
    target_type: String,
    #[serde(default)]
    description: String,
    strength: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TableInfo {
    #[serde(default)]
    indexes: BTreeMap<String, String>,
}

/// SurrealDB-backed graph storage
#[derive(Debug)]
pub struct SurrealGraphBackend {
    client: SurrealClient,
    closed: AtomicBool,
}

impl SurrealGraphBackend {
    /// Wrap a connected client, bootstrapping the shared tables
    pub async fn new(client: SurrealClient) -> GraphResult<Self> {
        apply_graph_schema(&client).await?;
        Ok(Self {
            client,
            closed: AtomicBool::new(false),
        })
    }

    pub async fn from_config(config: &StorageConfig) -> GraphResult<Self> {
        Self::new(SurrealClient::from_config(config).await?).await
    }

    /// Backend on a fresh in-memory database
    pub async fn memory() -> GraphResult<Self> {
        Self::new(SurrealClient::new_memory().await?).await
    }

    pub fn client(&self) -> &SurrealClient {
        &self.client
    }

    fn check_open(&self) -> GraphResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed.into());
        }
        Ok(())
    }

    /// Type of an existing entity called `name`, preferring `hint`
    async fn entity_type(
        &self,
        namespace: &Namespace,
        name: &str,
        hint: Option<&str>,
    ) -> GraphResult<Option<String>> {
        let types: Vec<TypeRow> = self
            .client
            .query_rows(
                "entity type lookup",
                queries::ENTITY_TYPES_BY_NAME,
                json!({ "ns": namespace.as_str(), "name": name }),
            )
            .await?;
        let preferred = hint.and_then(|hint| types.iter().find(|row| row.node_type == hint));
        Ok(preferred
            .or_else(|| types.first())
            .map(|row| row.node_type.clone()))
    }

    async fn upsert_node(&self, namespace: &Namespace, node: &GraphNode) -> GraphResult<()> {
        let ns = namespace.as_str();
        self.client
            .execute(
                "entity upsert",
                queries::UPSERT_ENTITY,
                json!({
                    "ns": ns,
                    "node_type": node.node_type,
                    "name": node.id,
                    "description": node.description,
                }),
            )
            .await?;

        let table = namespace.embedding_table();
        match &node.embedding {
            Some(embedding) => {
                self.client
                    .execute(
                        "embedding upsert",
                        queries::UPSERT_EMBEDDING,
                        json!({
                            "table": table,
                            "node_type": node.node_type,
                            "name": node.id,
                            "embedding": embedding,
                        }),
                    )
                    .await?
            }
            None => {
                self.client
                    .execute(
                        "embedding delete",
                        queries::DELETE_EMBEDDING,
                        json!({ "table": table, "node_type": node.node_type, "name": node.id }),
                    )
                    .await?
            }
        }
        Ok(())
    }

    /// At most `limit` edges touching `name`
    async fn edges_touching(
        &self,
        namespace: &Namespace,
        name: &str,
        limit: usize,
    ) -> GraphResult<Vec<Triple>> {
        let rows: Vec<EdgeRow> = self
            .client
            .query_rows(
                "edge lookup",
                queries::EDGES_TOUCHING,
                json!({ "ns": namespace.as_str(), "name": name, "limit": limit }),
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Triple::new(row.source, row.relation, row.target))
            .collect())
    }

    async fn index_exists(&self, namespace: &Namespace) -> bool {
        let table = namespace.embedding_table();
        let Ok(mut response) = self
            .client
            .query("table info", &queries::table_info(&table), json!({}))
            .await
        else {
            return false;
        };
        let info: Option<TableInfo> = response.take(0).unwrap_or(None);
        info.is_some_and(|info| info.indexes.contains_key(&namespace.index_name()))
    }
}

#[async_trait]
impl GraphBackend for SurrealGraphBackend {
    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }

    async fn upsert_graph(
        &self,
        namespace: &Namespace,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        source: Option<&SourceDocument>,
    ) -> GraphResult<UpsertSummary> {
        self.check_open()?;
        let ns = namespace.as_str();
        let mut summary = UpsertSummary::default();

        for node in nodes {
            self.upsert_node(namespace, node).await?;
            summary.nodes += 1;
        }

        for edge in edges {
            let source_type = self
                .entity_type(namespace, &edge.source, edge.source_type.as_deref())
                .await?;
            let target_type = self
                .entity_type(namespace, &edge.target, edge.target_type.as_deref())
                .await?;
            let (Some(source_type), Some(target_type)) = (source_type, target_type) else {
                debug!(
                    namespace = %namespace,
                    "Skipping edge with missing endpoint: {} -> {}",
                    edge.source, edge.target
                );
                summary.edges_skipped += 1;
                continue;
            };
            self.client
                .execute(
                    "relation upsert",
                    queries::UPSERT_RELATION,
                    json!({
                        "ns": ns,
                        "source": edge.source,
                        "source_type": source_type,
                        "relation": edge.relation,
                        "target": edge.target,
                        "target_type": target_type,
                        "description": edge.description,
                        "strength": edge.strength,
                    }),
                )
                .await?;
            summary.edges += 1;
        }

        if let Some(document) = source {
            self.client
                .execute(
                    "document upsert",
                    queries::UPSERT_DOCUMENT,
                    json!({
                        "ns": ns,
                        "doc_id": document.id,
                        "text": document.text,
                        "title": document.title,
                    }),
                )
                .await?;
            for node in nodes {
                self.client
                    .execute(
                        "mention upsert",
                        queries::UPSERT_MENTION,
                        json!({
                            "ns": ns,
                            "doc_id": document.id,
                            "node_type": node.node_type,
                            "name": node.id,
                        }),
                    )
                    .await?;
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
        let sql = queries::define_vector_index(
            &namespace.embedding_table(),
            &namespace.index_name(),
            spec.dimensions,
            spec.similarity,
        );
        self.client.execute("vector index", &sql, json!({})).await?;
        debug!(
            namespace = %namespace,
            index = %namespace.index_name(),
            dimensions = spec.dimensions,
            "Vector index defined"
        );
        Ok(())
    }

    async fn vector_index_ready(&self, namespace: &Namespace) -> GraphResult<bool> {
        self.check_open()?;
        Ok(self.index_exists(namespace).await)
    }

    async fn vector_search(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        limit: usize,
        similarity: SimilarityFunction,
    ) -> GraphResult<Vec<ScoredNode>> {
        self.check_open()?;
        if limit == 0 || vector.is_empty() {
            return Ok(Vec::new());
        }
        let table = namespace.embedding_table();
        let params = json!({ "vector": vector, "dimensions": vector.len() });

        let knn = queries::vector_knn(&table, limit, similarity);
        let rows: Vec<ScoreRow> = match self
            .client
            .query_rows("vector knn", &knn, params.clone())
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                debug!(namespace = %namespace, "KNN query unavailable, scanning: {}", e);
                let scan = queries::vector_scan(&table, limit, similarity);
                self.client.query_rows("vector scan", &scan, params).await?
            }
        };

        let mut hits: Vec<ScoredNode> = rows
            .into_iter()
            .map(|row| ScoredNode {
                id: row.name,
                node_type: row.node_type,
                score: row.score,
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
        let needle = name.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let sql = match mode {
            MatchMode::Exact => queries::MATCH_EXACT,
            MatchMode::Fuzzy => queries::MATCH_FUZZY,
        };
        let rows: Vec<NameRow> = self
            .client
            .query_rows(
                "entity match",
                sql,
                json!({ "ns": namespace.as_str(), "needle": needle }),
            )
            .await?;

        let mut names: Vec<String> = rows.into_iter().map(|row| row.name).collect();
        names.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        names.dedup();
        names.truncate(limit);
        Ok(names)
    }

    async fn expand(
        &self,
        namespace: &Namespace,
        anchors: &[String],
        hop_depth: u8,
        limit: usize,
    ) -> GraphResult<Vec<Triple>> {
        self.check_open()?;
        let mut triples = Vec::new();
        let mut seen = HashSet::new();
        let mut neighbors: Vec<String> = Vec::new();
        let anchor_set: HashSet<&str> = anchors.iter().map(String::as_str).collect();

        for anchor in anchors {
            for triple in self.edges_touching(namespace, anchor, limit).await? {
                if triples.len() >= limit {
                    return Ok(triples);
                }
                let other = if &triple.head == anchor {
                    triple.tail.clone()
                } else {
                    triple.head.clone()
                };
                if !anchor_set.contains(other.as_str()) && !neighbors.contains(&other) {
                    neighbors.push(other);
                }
                push_unique_triple(&mut triples, &mut seen, triple);
            }
        }

        if hop_depth >= 2 {
            for neighbor in &neighbors {
                for triple in self.edges_touching(namespace, neighbor, limit).await? {
                    if triples.len() >= limit {
                        return Ok(triples);
                    }
                    push_unique_triple(&mut triples, &mut seen, triple);
                }
            }
        }

        triples.truncate(limit);
        Ok(triples)
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> GraphResult<DeleteSummary> {
        self.check_open()?;
        let mut response = self
            .client
            .write(
                "namespace delete",
                queries::DELETE_NAMESPACE,
                json!({ "ns": namespace.as_str() }),
            )
            .await?;
        let summary = DeleteSummary {
            documents: take_count(&mut response, 0, "namespace delete")?,
            entities: take_count(&mut response, 1, "namespace delete")?,
            edges: take_count(&mut response, 2, "namespace delete")?,
        };
        self.client
            .execute(
                "embedding table removal",
                &queries::remove_embedding_table(&namespace.embedding_table()),
                json!({}),
            )
            .await?;
        Ok(summary)
    }

    async fn delete_document(
        &self,
        namespace: &Namespace,
        document_id: &str,
    ) -> GraphResult<DeleteSummary> {
        self.check_open()?;
        let ns = namespace.as_str();
        let table = namespace.embedding_table();

        #[derive(Deserialize)]
        struct MentionRow {
            node_type: String,
            name: String,
        }
        let mentioned: Vec<MentionRow> = self
            .client
            .query_rows(
                "document mentions",
                queries::DOCUMENT_MENTIONS,
                json!({ "ns": ns, "doc_id": document_id }),
            )
            .await?;

        let mut response = self
            .client
            .write(
                "document delete",
                queries::DELETE_DOCUMENT,
                json!({ "ns": ns, "doc_id": document_id }),
            )
            .await?;
        let mut summary = DeleteSummary {
            documents: take_count(&mut response, 0, "document delete")?,
            ..Default::default()
        };

        for mention in mentioned {
            let params = json!({
                "ns": ns,
                "table": table,
                "node_type": mention.node_type,
                "name": mention.name,
            });
            let mut response = self
                .client
                .query("mention count", queries::ENTITY_MENTION_COUNT, params.clone())
                .await?;
            if take_count(&mut response, 0, "mention count")? > 0 {
                continue;
            }

            let mut response = self
                .client
                .write("orphan delete", queries::DELETE_ENTITY, params.clone())
                .await?;
            summary.entities += take_count(&mut response, 0, "orphan delete")?;
            if take_count(&mut response, 3, "orphan delete")? > 0 {
                continue;
            }

            let mut response = self
                .client
                .write("orphan edges delete", queries::DELETE_EDGES_OF, params)
                .await?;
            summary.edges += take_count(&mut response, 0, "orphan edges delete")?;
        }

        Ok(summary)
    }

    async fn statistics(&self, namespace: &Namespace) -> GraphResult<GraphStatistics> {
        self.check_open()?;
        let mut response = self
            .client
            .query(
                "statistics",
                queries::STATISTICS,
                json!({ "ns": namespace.as_str() }),
            )
            .await?;

        let mut stats = GraphStatistics::empty(namespace);
        stats.nodes = take_count(&mut response, 0, "statistics")?;
        stats.edges = take_count(&mut response, 1, "statistics")?;
        stats.documents = take_count(&mut response, 2, "statistics")?;
        let types: Vec<TypeCountRow> = take_rows(&mut response, 3, "statistics")?;
        let relations: Vec<RelationCountRow> = take_rows(&mut response, 4, "statistics")?;
        stats.node_types = types.into_iter().map(|r| (r.node_type, r.count)).collect();
        stats.relation_types = relations.into_iter().map(|r| (r.relation, r.count)).collect();

        stats.vector_index = self.index_exists(namespace).await;
        if stats.vector_index {
            let mut response = self
                .client
                .query(
                    "embedding count",
                    &queries::count_embeddings(&namespace.embedding_table()),
                    json!({}),
                )
                .await?;
            stats.embedded_nodes = take_count(&mut response, 0, "embedding count")?;
        }
        Ok(stats)
    }

    async fn schema(&self, namespace: &Namespace) -> GraphResult<GraphSchema> {
        self.check_open()?;
        let mut response = self
            .client
            .query("schema", queries::SCHEMA, json!({ "ns": namespace.as_str() }))
            .await?;
        let labels: Vec<TypeRow> = take_rows(&mut response, 0, "schema")?;
        let patterns: Vec<PatternRow> = take_rows(&mut response, 1, "schema")?;

        let node_labels: BTreeSet<String> = labels.into_iter().map(|r| r.node_type).collect();
        let relation_types: BTreeSet<String> =
            patterns.iter().map(|p| p.relation.clone()).collect();
        let patterns: BTreeSet<SchemaPattern> = patterns
            .into_iter()
            .map(|p| SchemaPattern {
                source_type: p.source_type,
                relation: p.relation,
                target_type: p.target_type,
            })
            .collect();

        Ok(GraphSchema {
            node_labels: node_labels.into_iter().collect(),
            relation_types: relation_types.into_iter().collect(),
            patterns: patterns.into_iter().collect(),
        })
    }

    async fn export(&self, namespace: &Namespace) -> GraphResult<GraphExport> {
        self.check_open()?;
        let mut response = self
            .client
            .query("export", queries::EXPORT, json!({ "ns": namespace.as_str() }))
            .await?;
        let entities: Vec<EntityRow> = take_rows(&mut response, 0, "export")?;
        let relations: Vec<RelationRow> = take_rows(&mut response, 1, "export")?;

        Ok(GraphExport {
            namespace: namespace.to_string(),
            nodes: entities
                .into_iter()
                .map(|row| GraphNode::new(row.name, row.node_type).with_description(row.description))
                .collect(),
            edges: relations
                .into_iter()
                .map(|row| GraphEdge {
                    source: row.source,
                    source_type: Some(row.source_type),
                    relation: row.relation,
                    target: row.target,
                    target_type: Some(row.target_type),
                    description: row.description,
                    strength: row.strength,
                })
                .collect(),
        })
    }

    async fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.client.health().await
    }

    async fn close(&self) -> GraphResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("SurrealDB backend closed");
        }
        Ok(())
    }
}
