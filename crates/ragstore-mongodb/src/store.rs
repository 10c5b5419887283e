use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database};
use ragstore_core::RagError;

use crate::config::MongoDbConfig;
use crate::convert::vector_to_bson;
use crate::filter::{IDENTIFIER_FIELD, METADATA_FIELD, SCORE_FIELD, TEXT_FIELD};

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Parameters of an approximate nearest-neighbour search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearch {
    /// Name of the vector search index.
    pub index: String,
    /// Field holding the stored vectors.
    pub path: String,
    pub query_vector: Vec<f32>,
    pub num_candidates: i64,
    pub limit: i64,
    /// Pre-filter applied before ranking; empty means no filter.
    pub filter: BsonDocument,
}

/// The document-store operations the vector database adapter relies on.
///
/// Collections are addressed by name on each call. Errors come back as
/// [`RagError::VectorStore`] carrying the client's message.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_collection_names(&self) -> Result<Vec<String>, RagError>;

    async fn create_collection(&self, collection: &str) -> Result<(), RagError>;

    /// Drop a collection. Dropping a missing collection is not an error.
    async fn drop_collection(&self, collection: &str) -> Result<(), RagError>;

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<BsonDocument>,
    ) -> Result<(), RagError>;

    /// Return matching documents in natural order, at most `limit` of them.
    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        limit: Option<i64>,
    ) -> Result<Vec<BsonDocument>, RagError>;

    /// Return the closest documents first, each carrying a `score` field.
    async fn vector_search(
        &self,
        collection: &str,
        search: VectorSearch,
    ) -> Result<Vec<BsonDocument>, RagError>;

    /// Delete matching documents and return how many were removed.
    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<u64, RagError>;

    async fn count_documents(&self, collection: &str, filter: BsonDocument)
        -> Result<u64, RagError>;
}

// ---------------------------------------------------------------------------
// MongoClientStore
// ---------------------------------------------------------------------------

/// [`DocumentStore`] over a MongoDB database.
///
/// `vector_search` uses the `$vectorSearch` aggregation stage, which requires
/// an Atlas Vector Search index on the collection. Metadata keys used in
/// `where` filters must be declared as `filter` fields of that index.
#[derive(Clone)]
pub struct MongoClientStore {
    client: Client,
    database: Database,
}

impl MongoClientStore {
    /// Connect using the URI and driver options from `config`.
    pub async fn connect(config: &MongoDbConfig) -> Result<Self, RagError> {
        let options = config.client_options().await?;
        let client = Client::with_options(options).map_err(|e| {
            RagError::VectorStore(format!("failed to connect to MongoDB: {e}"))
        })?;
        tracing::info!(database = %config.database_name, "connected to MongoDB");
        Ok(Self::from_client(client, &config.database_name))
    }

    /// Wrap an existing MongoDB client.
    pub fn from_client(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }

    /// Return a reference to the underlying MongoDB client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Return a reference to the database in use.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(name)
    }
}

#[async_trait]
impl DocumentStore for MongoClientStore {
    async fn list_collection_names(&self) -> Result<Vec<String>, RagError> {
        self.database
            .list_collection_names()
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB list collections failed: {e}")))
    }

    async fn create_collection(&self, collection: &str) -> Result<(), RagError> {
        self.database
            .create_collection(collection)
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB create collection failed: {e}")))
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), RagError> {
        self.collection(collection)
            .drop()
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB drop failed: {e}")))
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<BsonDocument>,
    ) -> Result<(), RagError> {
        if docs.is_empty() {
            return Ok(());
        }
        self.collection(collection)
            .insert_many(docs)
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB insert failed: {e}")))?;
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        limit: Option<i64>,
    ) -> Result<Vec<BsonDocument>, RagError> {
        let coll = self.collection(collection);
        let mut find = coll.find(filter);
        if let Some(limit) = limit {
            find = find.limit(limit);
        }
        let cursor = find
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB find failed: {e}")))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB cursor error: {e}")))
    }

    async fn vector_search(
        &self,
        collection: &str,
        search: VectorSearch,
    ) -> Result<Vec<BsonDocument>, RagError> {
        let mut stage = doc! {
            "index": &search.index,
            "path": &search.path,
            "queryVector": vector_to_bson(&search.query_vector),
            "numCandidates": search.num_candidates,
            "limit": search.limit,
        };
        if !search.filter.is_empty() {
            stage.insert("filter", search.filter);
        }

        let pipeline = vec![
            doc! { "$vectorSearch": stage },
            doc! {
                "$project": {
                    "_id": 0,
                    IDENTIFIER_FIELD: 1,
                    TEXT_FIELD: 1,
                    METADATA_FIELD: 1,
                    SCORE_FIELD: { "$meta": "vectorSearchScore" },
                }
            },
        ];

        let cursor = self
            .collection(collection)
            .aggregate(pipeline)
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB aggregation failed: {e}")))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB cursor error: {e}")))
    }

    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<u64, RagError> {
        let result = self
            .collection(collection)
            .delete_many(filter)
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB delete failed: {e}")))?;
        Ok(result.deleted_count)
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: BsonDocument,
    ) -> Result<u64, RagError> {
        self.collection(collection)
            .count_documents(filter)
            .await
            .map_err(|e| RagError::VectorStore(format!("MongoDB count failed: {e}")))
    }
}
