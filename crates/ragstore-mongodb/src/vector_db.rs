use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use ragstore_core::{
    Embeddings, GetResult, Metadata, QueryOutput, RagError, VectorDb, WhereFilter,
};
use serde_json::Value;

use crate::config::MongoDbConfig;
use crate::convert::{bson_number, bson_to_metadata, metadata_to_bson, vector_to_bson};
use crate::filter::{
    get_filter, metadata_filter, EMBEDDING_FIELD, IDENTIFIER_FIELD, METADATA_FIELD, SCORE_FIELD,
    TEXT_FIELD,
};
use crate::store::{DocumentStore, MongoClientStore, VectorSearch};

// ---------------------------------------------------------------------------
// MongoDb
// ---------------------------------------------------------------------------

/// A [`VectorDb`] backed by a MongoDB collection.
///
/// Each added text becomes one document:
/// - `identifier`: the caller's id
/// - `text`: the text itself
/// - `metadata`: the caller's metadata plus a `text` key
/// - `embedding`: the vector (array of doubles)
///
/// Call [`set_embedder`](VectorDb::set_embedder) and then
/// [`initialize`](VectorDb::initialize) before any other operation.
pub struct MongoDb {
    config: MongoDbConfig,
    store: Arc<dyn DocumentStore>,
    embedder: Option<Arc<dyn Embeddings>>,
    initialized: bool,
}

impl MongoDb {
    /// Connect to MongoDB using `config`.
    pub async fn connect(config: MongoDbConfig) -> Result<Self, RagError> {
        let store = MongoClientStore::connect(&config).await?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Deserialize an untyped configuration and connect.
    ///
    /// A value that is not a MongoDB configuration fails with
    /// [`RagError::Config`] before any connection attempt.
    pub async fn from_config_value(value: Value) -> Result<Self, RagError> {
        let config = MongoDbConfig::from_value(value)?;
        Self::connect(config).await
    }

    /// Create the adapter over any [`DocumentStore`].
    pub fn with_store(config: MongoDbConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            store,
            embedder: None,
            initialized: false,
        }
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &MongoDbConfig {
        &self.config
    }

    /// Return the underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn embedder(&self) -> Result<&dyn Embeddings, RagError> {
        self.embedder.as_deref().ok_or_else(|| {
            RagError::NotInitialized(
                "embedder not set; call set_embedder before initialize".to_string(),
            )
        })
    }

    fn ensure_initialized(&self) -> Result<(), RagError> {
        if self.initialized {
            Ok(())
        } else {
            Err(RagError::NotInitialized(
                "vector db not initialized; call initialize first".to_string(),
            ))
        }
    }

    fn collection(&self) -> &str {
        &self.config.collection_name
    }

    fn build_record(
        id: String,
        text: String,
        mut metadata: Metadata,
        embedding: &[f32],
    ) -> BsonDocument {
        metadata.insert(TEXT_FIELD.to_string(), Value::String(text.clone()));
        doc! {
            IDENTIFIER_FIELD: id,
            TEXT_FIELD: text,
            METADATA_FIELD: metadata_to_bson(&metadata),
            EMBEDDING_FIELD: vector_to_bson(embedding),
        }
    }
}

/// MongoDB reads a negative limit as a single-batch cap, so counts never wrap.
fn clamp_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn validate_collection_name(name: &str) -> Result<(), RagError> {
    if name.is_empty() {
        return Err(RagError::Validation(
            "collection name must not be empty".to_string(),
        ));
    }
    if name.contains('$') || name.contains('\0') {
        return Err(RagError::Validation(format!(
            "invalid collection name {name:?}: must not contain '$' or NUL"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// VectorDb implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl VectorDb for MongoDb {
    fn set_embedder(&mut self, embedder: Arc<dyn Embeddings>) {
        self.embedder = Some(embedder);
    }

    async fn initialize(&mut self) -> Result<(), RagError> {
        self.embedder()?;
        validate_collection_name(self.collection())?;

        let existing = self.store.list_collection_names().await?;
        if !existing.iter().any(|name| name == self.collection()) {
            self.store.create_collection(self.collection()).await?;
            tracing::info!(collection = %self.collection(), "created collection");
        }
        self.initialized = true;
        Ok(())
    }

    async fn add(
        &self,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
        ids: Vec<String>,
    ) -> Result<(), RagError> {
        self.ensure_initialized()?;
        if documents.len() != metadatas.len() || documents.len() != ids.len() {
            return Err(RagError::Validation(format!(
                "documents ({}), metadatas ({}) and ids ({}) must have the same length",
                documents.len(),
                metadatas.len(),
                ids.len()
            )));
        }
        if documents.is_empty() {
            return Ok(());
        }

        let vectors = {
            let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
            self.embedder()?.embed_documents(&texts).await?
        };
        if vectors.len() != documents.len() {
            return Err(RagError::Embedding(format!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let records: Vec<BsonDocument> = ids
            .into_iter()
            .zip(documents)
            .zip(metadatas)
            .zip(&vectors)
            .map(|(((id, text), metadata), vector)| Self::build_record(id, text, metadata, vector))
            .collect();

        let count = records.len();
        self.store.insert_many(self.collection(), records).await?;
        tracing::debug!(collection = %self.collection(), count, "inserted records");
        Ok(())
    }

    async fn get(
        &self,
        ids: Option<&[&str]>,
        filter: Option<&WhereFilter>,
        limit: Option<usize>,
    ) -> Result<GetResult, RagError> {
        self.ensure_initialized()?;
        if limit == Some(0) {
            return Ok(GetResult::default());
        }

        let query = get_filter(ids, filter);
        let docs = self
            .store
            .find(self.collection(), query, limit.map(clamp_limit))
            .await?;

        let mut result = GetResult::default();
        for doc in docs {
            let id = doc.get_str(IDENTIFIER_FIELD).map_err(|e| {
                RagError::VectorStore(format!("record without `{IDENTIFIER_FIELD}`: {e}"))
            })?;
            result.ids.push(id.to_string());
            result.metadatas.push(
                doc.get_document(METADATA_FIELD)
                    .map(bson_to_metadata)
                    .unwrap_or_default(),
            );
        }
        tracing::debug!(collection = %self.collection(), found = result.len(), "fetched records");
        Ok(result)
    }

    async fn query(
        &self,
        input: &str,
        n_results: usize,
        filter: Option<&WhereFilter>,
        citations: bool,
    ) -> Result<QueryOutput, RagError> {
        self.ensure_initialized()?;
        if n_results == 0 {
            return Ok(if citations {
                QueryOutput::Cited(Vec::new())
            } else {
                QueryOutput::Texts(Vec::new())
            });
        }

        let query_vector = self.embedder()?.embed_query(input).await?;
        let search = VectorSearch {
            index: self.config.index_name.clone(),
            path: EMBEDDING_FIELD.to_string(),
            query_vector,
            num_candidates: self.config.num_candidates_for(n_results),
            limit: clamp_limit(n_results),
            filter: filter.map(metadata_filter).unwrap_or_default(),
        };
        let docs = self.store.vector_search(self.collection(), search).await?;
        tracing::debug!(collection = %self.collection(), hits = docs.len(), "vector search");

        let contexts = docs.into_iter().map(|doc| {
            let text = doc.get_str(TEXT_FIELD).unwrap_or("").to_string();
            (text, doc)
        });

        if !citations {
            return Ok(QueryOutput::Texts(contexts.map(|(text, _)| text).collect()));
        }

        let cited = contexts
            .map(|(text, doc)| {
                let mut metadata = doc
                    .get_document(METADATA_FIELD)
                    .map(bson_to_metadata)
                    .unwrap_or_default();
                let score = doc.get(SCORE_FIELD).and_then(bson_number).unwrap_or(0.0);
                metadata.insert(SCORE_FIELD.to_string(), score_value(score));
                (text, metadata)
            })
            .collect();
        Ok(QueryOutput::Cited(cited))
    }

    async fn count(&self) -> Result<u64, RagError> {
        self.ensure_initialized()?;
        self.store
            .count_documents(self.collection(), BsonDocument::new())
            .await
    }

    /// Delete every record whose metadata matches `filter`.
    ///
    /// An empty filter matches, and therefore deletes, every record.
    async fn delete(&self, filter: &WhereFilter) -> Result<(), RagError> {
        self.ensure_initialized()?;
        let deleted = self
            .store
            .delete_many(self.collection(), metadata_filter(filter))
            .await?;
        tracing::debug!(collection = %self.collection(), deleted, "deleted records");
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), RagError> {
        self.embedder()?;
        self.store.drop_collection(self.collection()).await?;
        tracing::info!(collection = %self.collection(), "dropped collection");
        self.initialized = false;
        self.initialize().await
    }

    fn set_collection_name(&mut self, name: &str) -> Result<(), RagError> {
        validate_collection_name(name)?;
        if name != self.config.collection_name {
            tracing::info!(from = %self.config.collection_name, to = %name, "switching collection");
            self.config.collection_name = name.to_string();
        }
        Ok(())
    }

    fn collection_name(&self) -> &str {
        self.collection()
    }
}

fn score_value(score: f64) -> Value {
    serde_json::Number::from_f64(score)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0.0))
}
