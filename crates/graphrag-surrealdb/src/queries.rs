//! Every SurrealQL statement the backend runs.
//!
//! Values always travel as bound parameters. The only interpolated pieces
//! are per-namespace table/index names (from `Namespace::storage_slug`, so
//! `[a-z0-9_]` only), vector dimensions and KNN limits.

use graphrag_config::SimilarityFunction;

// ----------------------------------------------------------------------------
// Schema bookkeeping
// ----------------------------------------------------------------------------

pub const SELECT_SCHEMA_VERSION: &str = "SELECT version FROM _schema_version:current";

pub const MARK_SCHEMA_VERSION: &str =
    "UPSERT _schema_version:current SET version = $version, applied_at = time::now()";

// ----------------------------------------------------------------------------
// Writes
// ----------------------------------------------------------------------------

pub const UPSERT_ENTITY: &str = r#"
UPSERT type::thing('entity', [$ns, $node_type, $name]) SET
    ns = $ns,
    name = $name,
    node_type = $node_type,
    description = $description,
    created = created ?? time::now(),
    updated = time::now()
"#;

pub const UPSERT_EMBEDDING: &str = r#"
UPSERT type::thing($table, [$node_type, $name]) SET
    name = $name,
    node_type = $node_type,
    embedding = $embedding
"#;

pub const DELETE_EMBEDDING: &str = "DELETE type::thing($table, [$node_type, $name])";

/// Types of the entities called `$name`, alphabetical
pub const ENTITY_TYPES_BY_NAME: &str =
    "SELECT node_type FROM entity WHERE ns = $ns AND name = $name ORDER BY node_type";

pub const UPSERT_RELATION: &str = r#"
UPSERT type::thing('relation', [$ns, $source, $relation, $target]) SET
    ns = $ns,
    source = $source,
    source_type = $source_type,
    relation = $relation,
    target = $target,
    target_type = $target_type,
    description = $description,
    strength = $strength,
    created = created ?? time::now(),
    updated = time::now()
"#;

pub const UPSERT_DOCUMENT: &str = r#"
UPSERT type::thing('document', [$ns, $doc_id]) SET
    ns = $ns,
    doc_id = $doc_id,
    text = $text,
    title = $title,
    created = created ?? time::now()
"#;

pub const UPSERT_MENTION: &str = r#"
UPSERT type::thing('mentions', [$ns, $doc_id, $node_type, $name]) SET
    ns = $ns,
    doc_id = $doc_id,
    node_type = $node_type,
    name = $name
"#;

// ----------------------------------------------------------------------------
// Retrieval
// ----------------------------------------------------------------------------

pub const MATCH_EXACT: &str =
    "SELECT name FROM entity WHERE ns = $ns AND string::lowercase(name) = $needle";

pub const MATCH_FUZZY: &str = "SELECT name FROM entity WHERE ns = $ns \
     AND string::contains(string::lowercase(name), $needle)";

/// Capped at `$limit` rows
pub const EDGES_TOUCHING: &str = "SELECT source, relation, target FROM relation \
     WHERE ns = $ns AND (source = $name OR target = $name) \
     ORDER BY source, relation, target LIMIT $limit";

// ----------------------------------------------------------------------------
// Deletes
// ----------------------------------------------------------------------------

/// Statements 0..=2 are the document, entity and relation counts
pub const DELETE_NAMESPACE: &str = r#"
SELECT count() AS count FROM document WHERE ns = $ns GROUP ALL;
SELECT count() AS count FROM entity WHERE ns = $ns GROUP ALL;
SELECT count() AS count FROM relation WHERE ns = $ns GROUP ALL;
DELETE entity WHERE ns = $ns;
DELETE relation WHERE ns = $ns;
DELETE document WHERE ns = $ns;
DELETE mentions WHERE ns = $ns;
"#;

pub const DOCUMENT_MENTIONS: &str =
    "SELECT node_type, name FROM mentions WHERE ns = $ns AND doc_id = $doc_id";

/// Statement 0 is the number of documents removed
pub const DELETE_DOCUMENT: &str = r#"
SELECT count() AS count FROM document WHERE ns = $ns AND doc_id = $doc_id GROUP ALL;
DELETE type::thing('document', [$ns, $doc_id]);
DELETE mentions WHERE ns = $ns AND doc_id = $doc_id;
"#;

pub const ENTITY_MENTION_COUNT: &str = "SELECT count() AS count FROM mentions \
     WHERE ns = $ns AND node_type = $node_type AND name = $name GROUP ALL";

/// Statement 0 is the number of entities removed, statement 3 the number
/// of entities still sharing the name
pub const DELETE_ENTITY: &str = r#"
SELECT count() AS count FROM entity WHERE ns = $ns AND node_type = $node_type AND name = $name GROUP ALL;
DELETE type::thing('entity', [$ns, $node_type, $name]);
DELETE type::thing($table, [$node_type, $name]);
SELECT count() AS count FROM entity WHERE ns = $ns AND name = $name GROUP ALL;
"#;

/// Statement 0 is the number of edges removed
pub const DELETE_EDGES_OF: &str = r#"
SELECT count() AS count FROM relation WHERE ns = $ns AND (source = $name OR target = $name) GROUP ALL;
DELETE relation WHERE ns = $ns AND (source = $name OR target = $name);
"#;

// ----------------------------------------------------------------------------
// Introspection
// ----------------------------------------------------------------------------

/// Entity, relation, document counts, then per-type and per-relation counts
pub const STATISTICS: &str = r#"
SELECT count() AS count FROM entity WHERE ns = $ns GROUP ALL;
SELECT count() AS count FROM relation WHERE ns = $ns GROUP ALL;
SELECT count() AS count FROM document WHERE ns = $ns GROUP ALL;
SELECT node_type, count() AS count FROM entity WHERE ns = $ns GROUP BY node_type;
SELECT relation, count() AS count FROM relation WHERE ns = $ns GROUP BY relation;
"#;

pub const SCHEMA: &str = r#"
SELECT node_type FROM entity WHERE ns = $ns GROUP BY node_type;
SELECT source_type, relation, target_type FROM relation WHERE ns = $ns GROUP BY source_type, relation, target_type;
"#;

pub const EXPORT: &str = r#"
SELECT name, node_type, description FROM entity WHERE ns = $ns ORDER BY node_type, name;
SELECT source, source_type, relation, target, target_type, description, strength FROM relation WHERE ns = $ns ORDER BY source, relation, target;
"#;

// ----------------------------------------------------------------------------
// Per-namespace vector tables
// ----------------------------------------------------------------------------

pub fn define_vector_index(
    table: &str,
    index: &str,
    dimensions: usize,
    similarity: SimilarityFunction,
) -> String {
    format!(
        "DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;\n\
         DEFINE INDEX IF NOT EXISTS {index} ON TABLE {table} FIELDS embedding \
         MTREE DIMENSION {dimensions} DIST {dist} TYPE F32;",
        dist = similarity.as_surql(),
    )
}

pub fn table_info(table: &str) -> String {
    format!("INFO FOR TABLE {table}")
}

/// Index-backed nearest neighbours, scored with `similarity`
pub fn vector_knn(table: &str, limit: usize, similarity: SimilarityFunction) -> String {
    format!(
        "SELECT name, node_type, {score} AS score \
         FROM {table} WHERE embedding <|{limit}|> $vector ORDER BY score DESC",
        score = similarity.surql_score(),
    )
}

/// Full scan fallback when the index cannot serve the query
pub fn vector_scan(table: &str, limit: usize, similarity: SimilarityFunction) -> String {
    format!(
        "SELECT name, node_type, {score} AS score \
         FROM {table} WHERE array::len(embedding) = $dimensions \
         ORDER BY score DESC LIMIT {limit}",
        score = similarity.surql_score(),
    )
}

pub fn count_embeddings(table: &str) -> String {
    format!("SELECT count() AS count FROM {table} GROUP ALL")
}

pub fn remove_embedding_table(table: &str) -> String {
    format!("REMOVE TABLE IF EXISTS {table}")
}
