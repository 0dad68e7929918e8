use crate::context::Context;
use crate::output;
use anyhow::{Context as _, Result};
use graphrag_core::Namespace;
use std::path::Path;

/// Export as JSON, to stdout or to `path`. Always JSON regardless of `--format`.
pub async fn execute(ctx: &Context, namespace: &Namespace, path: Option<&Path>) -> Result<String> {
    let export = ctx.service.export(namespace).await?;
    let json = output::to_json(&export)?;
    match path {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(format!(
                "Exported {} nodes and {} edges to {}",
                export.nodes.len(),
                export.edges.len(),
                path.display()
            ))
        }
        None => Ok(json),
    }
}
