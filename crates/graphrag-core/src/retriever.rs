//! GraphRetriever: the query side of the graph
//!
//! Two independent anchor strategies (vector similarity and entity-name
//! matching) plus bounded subgraph expansion. Each strategy has a lenient
//! form that degrades to empty and a `try_` form that reports errors.

use crate::error::GraphResult;
use crate::prompts;
use crate::resolver::EmbeddingResolver;
use crate::store::GraphStore;
use crate::types::{AnchorSet, MatchMode, Namespace, Triple};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct GraphRetriever {
    store: GraphStore,
    resolver: Arc<EmbeddingResolver>,
}

impl GraphRetriever {
    pub fn new(store: GraphStore, resolver: Arc<EmbeddingResolver>) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn resolver(&self) -> &Arc<EmbeddingResolver> {
        &self.resolver
    }

    /// Node ids semantically close to `question`, best first.
    ///
    /// Empty when the namespace has no embedding model or anything fails.
    pub async fn search_by_vector(
        &self,
        namespace: &Namespace,
        question: &str,
        score_threshold: f32,
        limit: usize,
    ) -> AnchorSet {
        self.try_search_by_vector(namespace, question, score_threshold, limit)
            .await
            .unwrap_or_else(|e| {
                warn!(namespace = %namespace, "Vector search failed: {}", e);
                AnchorSet::new()
            })
    }

    pub async fn try_search_by_vector(
        &self,
        namespace: &Namespace,
        question: &str,
        score_threshold: f32,
        limit: usize,
    ) -> GraphResult<AnchorSet> {
        if question.trim().is_empty() || limit == 0 {
            return Ok(AnchorSet::new());
        }
        let Some(embedder) = self.resolver.resolve(namespace) else {
            return Ok(AnchorSet::new());
        };

        let response = embedder.embed(question).await?;
        let hits = self
            .store
            .backend()
            .vector_search(
                namespace,
                &response.embedding,
                limit,
                self.store.index_config().similarity,
            )
            .await?;

        let anchors: AnchorSet = hits
            .into_iter()
            .filter(|hit| hit.score >= score_threshold)
            .map(|hit| hit.id)
            .take(limit)
            .collect();
        debug!(namespace = %namespace, anchors = anchors.len(), "Vector path");
        Ok(anchors)
    }

    /// Node ids whose names match the given entity names.
    ///
    /// Per name: exact (case-insensitive) first, substring when exact finds
    /// nothing. Results follow the order of `entity_names`.
    pub async fn search_by_entity_match(
        &self,
        namespace: &Namespace,
        entity_names: &[String],
        limit_per_entity: usize,
    ) -> AnchorSet {
        self.try_search_by_entity_match(namespace, entity_names, limit_per_entity)
            .await
            .unwrap_or_else(|e| {
                warn!(namespace = %namespace, "Entity match failed: {}", e);
                AnchorSet::new()
            })
    }

    pub async fn try_search_by_entity_match(
        &self,
        namespace: &Namespace,
        entity_names: &[String],
        limit_per_entity: usize,
    ) -> GraphResult<AnchorSet> {
        let mut anchors = AnchorSet::new();
        if limit_per_entity == 0 {
            return Ok(anchors);
        }
        let backend = self.store.backend();

        for name in entity_names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let mut matches = backend
                .match_entities(namespace, name, MatchMode::Exact, limit_per_entity)
                .await?;
            if matches.is_empty() {
                matches = backend
                    .match_entities(namespace, name, MatchMode::Fuzzy, limit_per_entity)
                    .await?;
            }
            anchors.extend(matches.into_iter().take(limit_per_entity));
        }
        debug!(namespace = %namespace, anchors = anchors.len(), "Entity path");
        Ok(anchors)
    }

    /// Triples around `anchors`, within `hop_depth` (clamped to 1..=2) hops
    pub async fn expand_subgraph(
        &self,
        namespace: &Namespace,
        anchors: &AnchorSet,
        hop_depth: u8,
        max_triples: usize,
    ) -> Vec<Triple> {
        self.try_expand_subgraph(namespace, anchors, hop_depth, max_triples)
            .await
            .unwrap_or_else(|e| {
                warn!(namespace = %namespace, "Subgraph expansion failed: {}", e);
                Vec::new()
            })
    }

    pub async fn try_expand_subgraph(
        &self,
        namespace: &Namespace,
        anchors: &AnchorSet,
        hop_depth: u8,
        max_triples: usize,
    ) -> GraphResult<Vec<Triple>> {
        if anchors.is_empty() || max_triples == 0 {
            return Ok(Vec::new());
        }
        let hop_depth = hop_depth.clamp(1, 2);
        let mut triples = self
            .store
            .backend()
            .expand(namespace, anchors.as_slice(), hop_depth, max_triples)
            .await?;
        triples.truncate(max_triples);
        debug!(
            namespace = %namespace,
            hop_depth,
            triples = triples.len(),
            "Expanded subgraph"
        );
        Ok(triples)
    }

    /// One context block, one triple per line; `None` when there are none
    pub fn to_contents(triples: &[Triple]) -> Option<String> {
        if triples.is_empty() {
            return None;
        }
        Some(
            triples
                .iter()
                .map(Triple::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Best-effort text-to-query prompt for the namespace's schema
    pub async fn build_query_prompt(&self, namespace: &Namespace) -> String {
        let schema = self.store.schema(namespace).await;
        prompts::query_prompt(&schema.to_prompt_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_contents() {
        assert_eq!(GraphRetriever::to_contents(&[]), None);
        let triples = vec![
            Triple::new("SAM ALTMAN", "CEO of", "OPENAI"),
            Triple::new("OPENAI", "released", "GPT-4"),
        ];
        assert_eq!(
            GraphRetriever::to_contents(&triples).unwrap(),
            "(SAM ALTMAN) --[CEO of]--> (OPENAI)\n(OPENAI) --[released]--> (GPT-4)"
        );
    }
}
