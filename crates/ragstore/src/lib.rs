//! ragstore — vector database adapters for retrieval-augmented generation.
//!
//! This crate re-exports the ragstore sub-crates for single-import usage.
//! Enable features to control which modules are available.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `embeddings`, `mongodb` |
//! | `embeddings` | `FakeEmbeddings` for tests and demos |
//! | `mongodb` | `MongoDb` vector database, `MongoDbConfig`, document stores |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ragstore::core::VectorDb;
//! use ragstore::mongodb::{MongoDb, MongoDbConfig};
//! ```

/// Core traits and types: VectorDb, Embeddings, RagError, GetResult, QueryOutput.
/// Always available.
pub use ragstore_core as core;

/// Embeddings implementations.
#[cfg(feature = "embeddings")]
pub use ragstore_embeddings as embeddings;

/// MongoDB vector database adapter.
#[cfg(feature = "mongodb")]
pub use ragstore_mongodb as mongodb;
