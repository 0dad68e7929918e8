//! # GraphRAG SurrealDB backend
//!
//! Embedded SurrealDB (in-memory or RocksDB) implementation of
//! [`graphrag_core::GraphBackend`].
//!
//! ```no_run
//! use graphrag_core::{GraphStore, Namespace};
//! use graphrag_surrealdb::SurrealGraphBackend;
//! use std::sync::Arc;
//!
//! # async fn demo() -> graphrag_core::GraphResult<()> {
//! let backend = SurrealGraphBackend::memory().await?;
//! let store = GraphStore::new(Arc::new(backend));
//! let stats = store.statistics(&Namespace::new("kb-1")?).await;
//! assert_eq!(stats.nodes, 0);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod queries;
pub mod schema;

pub use backend::SurrealGraphBackend;
pub use client::{ConnectionSettings, StoreResult, SurrealClient};
pub use error::StoreError;
