use crate::cli::OutputFormat;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use graphrag_core::Namespace;
use tracing::info;

/// Delete one document (and entities only it mentioned), or the whole knowledge base
pub async fn execute(
    ctx: &Context,
    namespace: &Namespace,
    document: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let summary = match document {
        Some(document_id) => ctx.service.delete_document(namespace, document_id).await?,
        None => {
            info!(namespace = %namespace, "Deleting knowledge base");
            ctx.service.delete_namespace(namespace).await?
        }
    };
    output::format_delete(&summary, format)
}
