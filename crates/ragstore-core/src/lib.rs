use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for ragstore.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("vector store error: {0}")]
    VectorStore(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("not initialized: {0}")]
    NotInitialized(String),
}

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Arbitrary metadata attached to a stored text.
pub type Metadata = HashMap<String, Value>;

/// Flat key/value constraint on stored metadata fields.
///
/// Values are handed to the store untouched, so they may carry store
/// operators (for MongoDB, e.g. `{"$in": [...]}`).
pub type WhereFilter = HashMap<String, Value>;

/// A document with content and metadata, as handed over by a loader or chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }
}

/// Ids and metadata of the records matched by [`VectorDb::get`].
///
/// Both vectors are parallel and follow the order the store returned them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResult {
    pub ids: Vec<String>,
    pub metadatas: Vec<Metadata>,
}

impl GetResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Contexts returned by [`VectorDb::query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryOutput {
    /// Matched texts only (citations off).
    Texts(Vec<String>),
    /// Matched texts paired with their source metadata (citations on).
    Cited(Vec<(String, Metadata)>),
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Texts(texts) => texts.len(),
            QueryOutput::Cited(cited) => cited.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop any citation metadata and keep the matched texts.
    pub fn into_texts(self) -> Vec<String> {
        match self {
            QueryOutput::Texts(texts) => texts,
            QueryOutput::Cited(cited) => cited.into_iter().map(|(text, _)| text).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Embeddings trait (implementations in ragstore-embeddings)
// ---------------------------------------------------------------------------

/// Trait for embedding text into vectors.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed multiple texts (for batch document embedding).
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

// ---------------------------------------------------------------------------
// VectorDb trait (implementations in ragstore-mongodb)
// ---------------------------------------------------------------------------

/// Generic vector database contract consumed by the retrieval layer.
///
/// An implementation is bound to one collection at a time. Data operations
/// are only valid after [`initialize`](VectorDb::initialize) has succeeded,
/// which in turn requires an embedder.
#[async_trait]
pub trait VectorDb: Send + Sync {
    /// Install the embedder used by `add` and `query`.
    fn set_embedder(&mut self, embedder: Arc<dyn Embeddings>);

    /// Check preconditions and make sure the current collection exists.
    async fn initialize(&mut self) -> Result<(), RagError>;

    /// Embed `documents` and store one record per document.
    ///
    /// `documents`, `metadatas` and `ids` are parallel and must have the same length.
    async fn add(
        &self,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
        ids: Vec<String>,
    ) -> Result<(), RagError>;

    /// Add loader documents; a thin wrapper over [`add`](VectorDb::add).
    async fn add_documents(&self, docs: Vec<Document>) -> Result<(), RagError> {
        let mut documents = Vec::with_capacity(docs.len());
        let mut metadatas = Vec::with_capacity(docs.len());
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(doc.id);
            documents.push(doc.content);
            metadatas.push(doc.metadata);
        }
        self.add(documents, metadatas, ids).await
    }

    /// Fetch ids and metadata of existing records.
    ///
    /// `ids` restricts to those identifiers (an empty slice means no
    /// restriction). `limit` caps the number of records: `None` returns all,
    /// `Some(0)` returns an empty result rather than meaning "unlimited".
    async fn get(
        &self,
        ids: Option<&[&str]>,
        filter: Option<&WhereFilter>,
        limit: Option<usize>,
    ) -> Result<GetResult, RagError>;

    /// Find the `n_results` records most similar to `input`.
    async fn query(
        &self,
        input: &str,
        n_results: usize,
        filter: Option<&WhereFilter>,
        citations: bool,
    ) -> Result<QueryOutput, RagError>;

    /// Number of records in the current collection.
    async fn count(&self) -> Result<u64, RagError>;

    /// Delete every record matching `filter`.
    async fn delete(&self, filter: &WhereFilter) -> Result<(), RagError>;

    /// Drop the current collection and initialize it again, empty.
    async fn reset(&mut self) -> Result<(), RagError>;

    /// Switch subsequent operations to another collection.
    fn set_collection_name(&mut self, name: &str) -> Result<(), RagError>;

    /// Name of the collection currently in use.
    fn collection_name(&self) -> &str;
}
