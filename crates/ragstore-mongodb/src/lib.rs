//! MongoDB vector database adapter for ragstore.
//!
//! This crate provides:
//! - [`MongoDb`]: an implementation of the [`VectorDb`](ragstore_core::VectorDb)
//!   contract that stores one record per text in a MongoDB collection and
//!   answers similarity queries through
//!   [Atlas Vector Search](https://www.mongodb.com/docs/atlas/atlas-vector-search/).
//! - [`DocumentStore`]: the narrow slice of a document-store client the adapter
//!   needs, with a MongoDB implementation ([`MongoClientStore`]) and an
//!   in-process one ([`InMemoryDocumentStore`]).
//! - [`MongoDbConfig`]: connection and collection parameters.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ragstore_mongodb::{MongoDb, MongoDbConfig, VectorDb};
//! # use ragstore_core::Embeddings;
//!
//! # async fn example(embedder: Arc<dyn Embeddings>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = MongoDbConfig::new()
//!     .with_uri("mongodb+srv://...")
//!     .with_database_name("rag")
//!     .with_collection_name("docs");
//! let mut db = MongoDb::connect(config).await?;
//! db.set_embedder(embedder);
//! db.initialize().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod convert;
mod filter;
mod memory;
mod store;
mod vector_db;

pub use config::MongoDbConfig;
pub use filter::{
    metadata_filter, EMBEDDING_FIELD, IDENTIFIER_FIELD, METADATA_FIELD, SCORE_FIELD, TEXT_FIELD,
};
pub use memory::InMemoryDocumentStore;
pub use store::{DocumentStore, MongoClientStore, VectorSearch};
pub use vector_db::MongoDb;

// Re-export core traits and the BSON crate used by the store seam.
pub use bson;
pub use ragstore_core::{
    Document, Embeddings, GetResult, Metadata, QueryOutput, RagError, VectorDb, WhereFilter,
};
