//! Rendering of command results as tables or JSON

use crate::cli::OutputFormat;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use graphrag_core::{
    DeleteSummary, GraphAnswer, GraphSchema, GraphStatistics, HybridRetrieval, IngestionReport,
    Triple,
};
use serde::Serialize;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn format_triples(triples: &[Triple]) -> String {
    if triples.is_empty() {
        return "No facts found.".to_string();
    }
    let mut table = new_table(vec!["Head", "Relation", "Tail"]);
    for triple in triples {
        table.add_row(vec![&triple.head, &triple.relation, &triple.tail]);
    }
    table.to_string()
}

pub fn format_retrieval(retrieval: &HybridRetrieval, format: OutputFormat, diagnostics: bool) -> Result<String> {
    match format {
        OutputFormat::Json if diagnostics => to_json(retrieval),
        OutputFormat::Json => to_json(&retrieval.triples),
        OutputFormat::Table => {
            let mut out = format_triples(&retrieval.triples);
            if diagnostics {
                let mut table = new_table(vec!["Path", "Anchors", "Error"]);
                table.add_row(vec![
                    Cell::new("vector"),
                    Cell::new(join(retrieval.vector_anchors.iter())),
                    error_cell(retrieval.vector_error.as_deref()),
                ]);
                table.add_row(vec![
                    Cell::new(format!("entity {:?}", retrieval.entity_names)),
                    Cell::new(join(retrieval.entity_anchors.iter())),
                    error_cell(retrieval.entity_error.as_deref()),
                ]);
                table.add_row(vec![
                    Cell::new("merged"),
                    Cell::new(join(retrieval.anchors.iter())),
                    Cell::new(""),
                ]);
                out.push_str("\n\n");
                out.push_str(&table.to_string());
            }
            Ok(out)
        }
    }
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn error_cell(error: Option<&str>) -> Cell {
    match error {
        Some(error) => Cell::new(error).fg(Color::Red),
        None => Cell::new(""),
    }
}

pub fn format_answer(answer: &GraphAnswer, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(answer),
        OutputFormat::Table if answer.found => Ok(format!(
            "{}\n\n{}",
            answer.answer,
            format_triples(&answer.triples)
        )),
        OutputFormat::Table => Ok(answer.answer.clone()),
    }
}

pub fn format_stats(stats: &GraphStatistics, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(stats);
    }

    let mut table = new_table(vec!["Metric", "Value"]);
    table.add_row(vec!["Knowledge base".to_string(), stats.namespace.clone()]);
    table.add_row(vec!["Nodes".to_string(), stats.nodes.to_string()]);
    table.add_row(vec!["Edges".to_string(), stats.edges.to_string()]);
    table.add_row(vec!["Documents".to_string(), stats.documents.to_string()]);
    table.add_row(vec!["Embedded nodes".to_string(), stats.embedded_nodes.to_string()]);
    table.add_row(vec![
        "Vector index".to_string(),
        if stats.vector_index { "yes" } else { "no" }.to_string(),
    ]);
    let mut out = table.to_string();

    if !stats.node_types.is_empty() {
        let mut types = new_table(vec!["Node type", "Count"]);
        for (label, count) in &stats.node_types {
            types.add_row(vec![label.clone(), count.to_string()]);
        }
        out.push_str("\n\n");
        out.push_str(&types.to_string());
    }
    if !stats.relation_types.is_empty() {
        let mut relations = new_table(vec!["Relation", "Count"]);
        for (relation, count) in &stats.relation_types {
            relations.add_row(vec![relation.clone(), count.to_string()]);
        }
        out.push_str("\n\n");
        out.push_str(&relations.to_string());
    }
    Ok(out)
}

pub fn format_schema(schema: &GraphSchema, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(schema),
        OutputFormat::Table if schema.is_empty() => Ok("Knowledge base is empty.".to_string()),
        OutputFormat::Table => Ok(schema.to_prompt_text()),
    }
}

pub fn format_report(report: &IngestionReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut table = new_table(vec!["Documents", "Succeeded", "Nodes", "Edges", "Edges skipped"]);
    table.add_row(vec![
        report.documents.to_string(),
        report.succeeded.to_string(),
        report.nodes.to_string(),
        report.edges.to_string(),
        report.edges_skipped.to_string(),
    ]);
    let mut out = table.to_string();

    if !report.failures.is_empty() {
        let mut failures = new_table(vec!["Failed document", "Error"]);
        for failure in &report.failures {
            failures.add_row(vec![
                Cell::new(&failure.document_id),
                Cell::new(&failure.error).fg(Color::Red),
            ]);
        }
        out.push_str("\n\n");
        out.push_str(&failures.to_string());
    }
    Ok(out)
}

pub fn format_delete(summary: &DeleteSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(summary),
        OutputFormat::Table => Ok(format!(
            "Deleted {} document(s), {} entit{}, {} edge(s)",
            summary.documents,
            summary.entities,
            if summary.entities == 1 { "y" } else { "ies" },
            summary.edges
        )),
    }
}
