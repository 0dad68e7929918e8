//! # GraphRAG Configuration Library
//!
//! Type-safe configuration for the GraphRAG workspace: storage backend,
//! embedding and chat models, knowledge bases, retrieval tunables and the
//! per-namespace vector index.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graphrag_config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     println!("hop depth: {}", config.retrieval.hop_depth);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod components;
mod loader;

pub use components::*;
pub use loader::*;
