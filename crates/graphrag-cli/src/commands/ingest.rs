use crate::cli::OutputFormat;
use crate::context::Context;
use crate::output;
use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use graphrag_core::{
    GraphDocument, GraphEdge, GraphNode, GraphResult, GraphTransformer, Namespace, SourceDocument,
};
use graphrag_llm::LlmGraphTransformer;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub include_source: bool,
    pub with_embedding: bool,
}

/// One document per file, then one per inline text. Blank inputs are skipped.
pub fn load_documents(files: &[PathBuf], texts: &[String]) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::with_capacity(files.len() + texts.len());
    for path in files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if text.trim().is_empty() {
            continue;
        }
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        documents.push(SourceDocument::new(text).with_title(title));
    }
    documents.extend(
        texts
            .iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| SourceDocument::new(text.as_str())),
    );
    Ok(documents)
}

/// Extract documents with the chat model and write them
pub async fn execute(
    ctx: &Context,
    namespace: &Namespace,
    documents: &[SourceDocument],
    options: IngestOptions,
    format: OutputFormat,
) -> Result<String> {
    if documents.is_empty() {
        bail!("Nothing to ingest: pass files or --text");
    }
    let Some(chat) = &ctx.chat else {
        bail!("Graph extraction needs a chat model; configure [chat] or import with --graph");
    };

    let transformer = LlmGraphTransformer::from_config(chat.clone(), &ctx.config.extraction);
    info!(namespace = %namespace, documents = documents.len(), "Ingesting documents");
    let report = ctx
        .service
        .process_documents(
            namespace,
            documents,
            &transformer,
            options.include_source,
            options.with_embedding,
        )
        .await;
    output::format_report(&report, format)
}

/// Graph file layout accepted by `--graph`; `export` writes a superset
#[derive(Debug, Deserialize)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default, alias = "relationships")]
    edges: Vec<GraphEdge>,
}

/// Hands back a graph that was extracted elsewhere
struct ImportedGraph(GraphDocument);

#[async_trait]
impl GraphTransformer for ImportedGraph {
    async fn extract(&self, _document: &SourceDocument) -> GraphResult<GraphDocument> {
        Ok(self.0.clone())
    }
}

/// Write a pre-extracted graph file as a single document
pub async fn import_graph(
    ctx: &Context,
    namespace: &Namespace,
    path: &Path,
    options: IngestOptions,
    format: OutputFormat,
) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: GraphFile = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a graph file", path.display()))?;

    let source = SourceDocument::new(content.as_str()).with_title(path.display().to_string());
    let mut graph = GraphDocument::new(source.clone());
    graph.nodes = file.nodes;
    graph.edges = file.edges;
    info!(
        namespace = %namespace,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Importing graph from {}",
        path.display()
    );

    let report = ctx
        .service
        .process_documents(
            namespace,
            &[source],
            &ImportedGraph(graph),
            options.include_source,
            options.with_embedding,
        )
        .await;
    output::format_report(&report, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_documents_skips_blank_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openai.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Sam Altman is the CEO of OpenAI.").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "  \n").unwrap();

        let documents = load_documents(
            &[path, dir.path().join("empty.txt")],
            &["Paris is in France.".to_string(), " ".to_string()],
        )
        .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].title.as_deref(), Some("openai.txt"));
        assert_eq!(documents[1].text, "Paris is in France.");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_documents(&[PathBuf::from("/nonexistent/doc.txt")], &[]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/doc.txt"));
    }
}
