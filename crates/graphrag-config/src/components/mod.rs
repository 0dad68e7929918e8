//! Configuration components
//!
//! One focused struct per concern, each with serde defaults so that a
//! partial TOML file is always valid.

pub mod chat;
pub mod embedding;
pub mod extraction;
pub mod knowledge_base;
pub mod retrieval;
pub mod storage;

pub use chat::*;
pub use embedding::*;
pub use extraction::*;
pub use knowledge_base::*;
pub use retrieval::*;
pub use storage::*;
