//! Schema bootstrap for the shared graph tables
//!
//! Per-namespace embedding tables are not defined here; they are created
//! lazily by `ensure_vector_index`.

use crate::client::{SurrealClient, StoreResult};
use crate::queries;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

/// Bump when the statements below change
pub const SCHEMA_VERSION: &str = "graph-v1";

const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS entity SCHEMALESS;
DEFINE INDEX IF NOT EXISTS entity_ns_name ON TABLE entity FIELDS ns, name;
DEFINE INDEX IF NOT EXISTS entity_ns_type ON TABLE entity FIELDS ns, node_type;

DEFINE TABLE IF NOT EXISTS relation SCHEMALESS;
DEFINE INDEX IF NOT EXISTS relation_ns_source ON TABLE relation FIELDS ns, source;
DEFINE INDEX IF NOT EXISTS relation_ns_target ON TABLE relation FIELDS ns, target;

DEFINE TABLE IF NOT EXISTS document SCHEMALESS;
DEFINE INDEX IF NOT EXISTS document_ns ON TABLE document FIELDS ns;

DEFINE TABLE IF NOT EXISTS mentions SCHEMALESS;
DEFINE INDEX IF NOT EXISTS mentions_ns_doc ON TABLE mentions FIELDS ns, doc_id;
DEFINE INDEX IF NOT EXISTS mentions_ns_entity ON TABLE mentions FIELDS ns, node_type, name;

DEFINE TABLE IF NOT EXISTS _schema_version SCHEMALESS;
"#;

#[derive(Debug, Deserialize)]
struct VersionRow {
    version: String,
}

/// Apply the graph schema unless this database already carries the
/// current [`SCHEMA_VERSION`]
pub async fn apply_graph_schema(client: &SurrealClient) -> StoreResult<()> {
    if schema_version(client).await.as_deref() == Some(SCHEMA_VERSION) {
        trace!("Schema {} already present", SCHEMA_VERSION);
        return Ok(());
    }

    let start = std::time::Instant::now();
    let statements = statements(SCHEMA);
    debug!("Applying {} schema statements", statements.len());

    // batch first, then one statement at a time
    if client
        .execute("schema batch", &statements.join(";\n"), json!({}))
        .await
        .is_err()
    {
        debug!("Schema batch failed, applying statements individually");
        for statement in &statements {
            if let Err(e) = client.execute("schema statement", statement, json!({})).await {
                let message = e.to_string();
                if !message.contains("already exists") {
                    return Err(e);
                }
                trace!("Schema element already exists: {}", statement);
            }
        }
    }

    client
        .execute(
            "schema version",
            queries::MARK_SCHEMA_VERSION,
            json!({ "version": SCHEMA_VERSION }),
        )
        .await?;
    debug!("Schema {} applied in {:?}", SCHEMA_VERSION, start.elapsed());
    Ok(())
}

async fn schema_version(client: &SurrealClient) -> Option<String> {
    client
        .query_rows::<VersionRow>("schema version", queries::SELECT_SCHEMA_VERSION, json!({}))
        .await
        .ok()
        .and_then(|rows| rows.into_iter().next())
        .map(|row| row.version)
}

fn statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("--"))
        .collect()
}
