//! Embedded SurrealDB client
//!
//! ## Supported engines
//!
//! - **Memory (Mem)**: in-memory storage for tests and ephemeral runs
//! - **File (RocksDB)**: persistent storage in a directory
//!
//! ```no_run
//! use graphrag_surrealdb::SurrealClient;
//!
//! # async fn demo() -> Result<(), graphrag_surrealdb::StoreError> {
//! let client = SurrealClient::new_memory().await?;
//! client
//!     .execute("test", "DEFINE TABLE IF NOT EXISTS entity SCHEMALESS", serde_json::json!({}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::StoreError;
use graphrag_config::StorageConfig;
use graphrag_core::{retry_with_backoff, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use surrealdb::engine::local::Db;
use surrealdb::{Response, Surreal};
use tokio::sync::Mutex;
use tracing::{debug, trace};

pub type StoreResult<T> = Result<T, StoreError>;

/// Where and under which SurrealDB namespace/database to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub namespace: String,
    pub database: String,
    /// `None` selects the in-memory engine
    pub path: Option<PathBuf>,
}

impl ConnectionSettings {
    pub fn from_storage(config: &StorageConfig) -> Self {
        Self {
            namespace: config.surreal_namespace.clone(),
            database: config.database.clone(),
            path: (!config.is_in_memory()).then(|| config.database_path()),
        }
    }

    fn target(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}

/// `SELECT count() AS count ... GROUP ALL` row
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub count: usize,
}

/// Backoff for statements that lost an optimistic commit race
fn conflict_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 8,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(200),
        backoff_multiplier: 2.0,
    }
}

/// Thin wrapper around `Surreal<Db>`.
///
/// Arc-wrapped so clones share one connection; opening a RocksDB directory
/// twice in one process fails on the file lock.
///
/// Writes issued through [`SurrealClient::write`] and
/// [`SurrealClient::execute`] take a process-wide gate, so writers sharing
/// a client do not race each other's transactions. Conflicts that still
/// occur are retried with backoff.
#[derive(Clone)]
pub struct SurrealClient {
    inner: Arc<SurrealClientInner>,
}

struct SurrealClientInner {
    db: Surreal<Db>,
    settings: ConnectionSettings,
    write_gate: Mutex<()>,
    conflict_policy: RetryPolicy,
}

impl std::fmt::Debug for SurrealClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealClient")
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl SurrealClient {
    pub async fn connect(settings: ConnectionSettings) -> StoreResult<Self> {
        use surrealdb::engine::local::{Mem, RocksDb};

        let open_error = |source| StoreError::Open {
            target: settings.target(),
            source,
        };
        let db = match &settings.path {
            None => Surreal::new::<Mem>(()).await.map_err(open_error)?,
            Some(path) => {
                if let Some(parent) = path.parent() {
                    // RocksDB creates the leaf directory but not its parents
                    std::fs::create_dir_all(parent).map_err(|source| StoreError::OpenDir {
                        target: parent.display().to_string(),
                        source,
                    })?;
                }
                Surreal::new::<RocksDb>(path.clone())
                    .await
                    .map_err(open_error)?
            }
        };

        db.use_ns(&settings.namespace)
            .use_db(&settings.database)
            .await
            .map_err(open_error)?;

        debug!(
            target_db = %settings.target(),
            namespace = %settings.namespace,
            database = %settings.database,
            "Connected to SurrealDB"
        );
        Ok(Self {
            inner: Arc::new(SurrealClientInner {
                db,
                settings,
                write_gate: Mutex::new(()),
                conflict_policy: conflict_policy(),
            }),
        })
    }

    pub async fn from_config(config: &StorageConfig) -> StoreResult<Self> {
        Self::connect(ConnectionSettings::from_storage(config)).await
    }

    /// In-memory database, one per call
    pub async fn new_memory() -> StoreResult<Self> {
        Self::connect(ConnectionSettings {
            namespace: "graphrag".to_string(),
            database: "graph".to_string(),
            path: None,
        })
        .await
    }

    /// RocksDB database stored under `path`
    pub async fn new_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::connect(ConnectionSettings {
            namespace: "graphrag".to_string(),
            database: "graph".to_string(),
            path: Some(path.as_ref().to_path_buf()),
        })
        .await
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.inner.db
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    /// Run `sql` with every key of the `params` object bound as `$key`.
    ///
    /// Statement errors are surfaced; the response is returned for typed
    /// extraction with [`take_rows`]. Write conflicts are retried.
    pub async fn query(
        &self,
        context: &'static str,
        sql: &str,
        params: Value,
    ) -> StoreResult<Response> {
        retry_with_backoff(
            &self.inner.conflict_policy,
            || self.query_once(context, sql, params.clone()),
            StoreError::is_conflict,
        )
        .await
    }

    /// [`SurrealClient::query`] under the write gate
    pub async fn write(
        &self,
        context: &'static str,
        sql: &str,
        params: Value,
    ) -> StoreResult<Response> {
        let _gate = self.inner.write_gate.lock().await;
        self.query(context, sql, params).await
    }

    /// Run `sql` for its side effects
    pub async fn execute(&self, context: &'static str, sql: &str, params: Value) -> StoreResult<()> {
        self.write(context, sql, params).await.map(|_| ())
    }

    async fn query_once(
        &self,
        context: &'static str,
        sql: &str,
        params: Value,
    ) -> StoreResult<Response> {
        trace!(context, sql, "SurrealQL");
        let mut query = self.inner.db.query(sql);
        if let Value::Object(map) = params {
            for (key, value) in map {
                query = query.bind((key, value));
            }
        }
        let response = query.await.map_err(StoreError::query(context))?;
        response.check().map_err(StoreError::query(context))
    }

    /// Rows of the first statement of `sql`
    pub async fn query_rows<T: DeserializeOwned>(
        &self,
        context: &'static str,
        sql: &str,
        params: Value,
    ) -> StoreResult<Vec<T>> {
        let mut response = self.query(context, sql, params).await?;
        take_rows(&mut response, 0, context)
    }

    pub async fn health(&self) -> bool {
        self.inner.db.health().await.is_ok()
    }
}

/// Deserialize the rows of statement `index`
pub(crate) fn take_rows<T: DeserializeOwned>(
    response: &mut Response,
    index: usize,
    context: &'static str,
) -> StoreResult<Vec<T>> {
    response.take(index).map_err(StoreError::decode(context))
}

/// Value of a `count() ... GROUP ALL` statement; no rows means zero
pub(crate) fn take_count(
    response: &mut Response,
    index: usize,
    context: &'static str,
) -> StoreResult<usize> {
    let rows: Vec<CountRow> = take_rows(response, index, context)?;
    Ok(rows.first().map(|row| row.count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_client_binds_parameters() {
        let client = SurrealClient::new_memory().await.unwrap();
        client
            .execute(
                "seed",
                "CREATE type::thing('note', $key) SET label = $label",
                json!({ "key": "a", "label": "quote \" and 'apostrophe'" }),
            )
            .await
            .unwrap();

        #[derive(Deserialize)]
        struct Row {
            label: String,
        }
        let rows: Vec<Row> = client
            .query_rows("read", "SELECT label FROM note", json!({}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "quote \" and 'apostrophe'");
    }

    #[tokio::test]
    async fn test_invalid_statement_is_query_error() {
        let client = SurrealClient::new_memory().await.unwrap();
        let err = client
            .execute("broken", "SELEC nothing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { context: "broken", .. }));
    }

    #[tokio::test]
    async fn test_count_of_missing_rows_is_zero() {
        let client = SurrealClient::new_memory().await.unwrap();
        let mut response = client
            .query(
                "count",
                "SELECT count() AS count FROM nothing_here GROUP ALL",
                json!({}),
            )
            .await
            .unwrap();
        assert_eq!(take_count(&mut response, 0, "count").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_parent_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = SurrealClient::new_file(blocker.join("nested").join("graph.db"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::OpenDir { .. }));
        let err: graphrag_core::GraphError = err.into();
        assert!(matches!(err, graphrag_core::GraphError::Connection(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_share_one_client() {
        let client = SurrealClient::new_memory().await.unwrap();
        let mut handles = Vec::new();
        for i in 0..16 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client
                    .execute(
                        "counter",
                        "UPSERT type::thing('counter', 'shared') SET hits += 1, last = $i",
                        json!({ "i": i }),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        #[derive(Deserialize)]
        struct Row {
            hits: usize,
        }
        let rows: Vec<Row> = client
            .query_rows("read", "SELECT hits FROM counter", json!({}))
            .await
            .unwrap();
        assert_eq!(rows[0].hits, 16);
    }

    #[test]
    fn test_settings_from_storage() {
        let config = StorageConfig {
            path: Some(PathBuf::from(":memory:")),
            ..Default::default()
        };
        assert_eq!(ConnectionSettings::from_storage(&config).path, None);

        let config = StorageConfig {
            path: Some(PathBuf::from("/tmp/graph.db")),
            ..Default::default()
        };
        let settings = ConnectionSettings::from_storage(&config);
        assert_eq!(settings.path, Some(PathBuf::from("/tmp/graph.db")));
        assert_eq!(settings.namespace, "graphrag");
    }
}
