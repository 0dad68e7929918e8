//! Graph extraction abstraction

use crate::error::GraphResult;
use crate::types::{GraphDocument, SourceDocument};
use async_trait::async_trait;

/// Extracts entities and relationships from a document
#[async_trait]
pub trait GraphTransformer: Send + Sync {
    async fn extract(&self, document: &SourceDocument) -> GraphResult<GraphDocument>;

    /// Extract every document, failing on the first error
    async fn transform(&self, documents: &[SourceDocument]) -> GraphResult<Vec<GraphDocument>> {
        let mut out = Vec::with_capacity(documents.len());
        for document in documents {
            out.push(self.extract(document).await?);
        }
        Ok(out)
    }
}
