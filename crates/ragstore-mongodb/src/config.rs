use std::fmt;

use mongodb::options::ClientOptions;
use ragstore_core::RagError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Environment variable consulted when no URI is configured.
pub const MONGODB_URI_ENV: &str = "MONGODB_URI";
const MONGODB_DATABASE_ENV: &str = "MONGODB_DATABASE";
const MONGODB_COLLECTION_ENV: &str = "MONGODB_COLLECTION";

const DEFAULT_COLLECTION: &str = "ragstore";
const DEFAULT_DATABASE: &str = "ragstore";
const DEFAULT_INDEX: &str = "vector_index";

// ---------------------------------------------------------------------------
// MongoDbConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`MongoDb`](crate::MongoDb) vector database.
///
/// Every field has a default, so a partial JSON/TOML object deserializes.
/// Unknown fields are rejected, which catches configuration meant for a
/// different backend.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MongoDbConfig {
    /// Collection holding the corpus (default: `ragstore`).
    pub collection_name: String,
    /// Connection URI. When unset, `MONGODB_URI` is used.
    pub uri: Option<String>,
    /// Database name (default: `ragstore`).
    pub database_name: String,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Replica set name, if any.
    pub replica_set: Option<String>,
    /// Whether the driver retries failed writes once (default: `true`).
    pub retry_writes: bool,
    /// Application name reported to the server.
    pub app_name: Option<String>,
    /// Name of the Atlas Vector Search index (default: `vector_index`).
    pub index_name: String,
    /// Number of candidates for `$vectorSearch` (default: `10 * n_results`).
    pub num_candidates: Option<i64>,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION.to_string(),
            uri: None,
            database_name: DEFAULT_DATABASE.to_string(),
            username: None,
            password: None,
            replica_set: None,
            retry_writes: true,
            app_name: None,
            index_name: DEFAULT_INDEX.to_string(),
            num_candidates: None,
        }
    }
}

impl fmt::Debug for MongoDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoDbConfig")
            .field("collection_name", &self.collection_name)
            .field("uri", &self.uri.as_ref().map(|_| "<set>"))
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("replica_set", &self.replica_set)
            .field("retry_writes", &self.retry_writes)
            .field("app_name", &self.app_name)
            .field("index_name", &self.index_name)
            .field("num_candidates", &self.num_candidates)
            .finish()
    }
}

impl MongoDbConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `MONGODB_URI`, `MONGODB_DATABASE` and
    /// `MONGODB_COLLECTION` when they are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(uri) = lookup(MONGODB_URI_ENV) {
            config.uri = Some(uri);
        }
        if let Some(database) = lookup(MONGODB_DATABASE_ENV) {
            config.database_name = database;
        }
        if let Some(collection) = lookup(MONGODB_COLLECTION_ENV) {
            config.collection_name = collection;
        }
        config
    }

    /// Deserialize an untyped configuration value.
    pub fn from_value(value: Value) -> Result<Self, RagError> {
        serde_json::from_value(value)
            .map_err(|e| RagError::Config(format!("not a MongoDB vector db config: {e}")))
    }

    /// Set the collection name.
    pub fn with_collection_name(mut self, collection_name: impl Into<String>) -> Self {
        self.collection_name = collection_name.into();
        self
    }

    /// Set the connection URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn with_database_name(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = database_name.into();
        self
    }

    /// Set the username and password used to authenticate.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the replica set name.
    pub fn with_replica_set(mut self, replica_set: impl Into<String>) -> Self {
        self.replica_set = Some(replica_set.into());
        self
    }

    /// Enable or disable retryable writes.
    pub fn with_retry_writes(mut self, retry_writes: bool) -> Self {
        self.retry_writes = retry_writes;
        self
    }

    /// Set the application name.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Set the vector search index name.
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Set the number of candidates for `$vectorSearch`.
    ///
    /// If not set, defaults to `10 * n_results` at query time.
    pub fn with_num_candidates(mut self, num_candidates: i64) -> Self {
        self.num_candidates = Some(num_candidates);
        self
    }

    /// Number of `$vectorSearch` candidates for a query returning `k` results.
    ///
    /// Never lower than `k`, which Atlas rejects.
    pub fn num_candidates_for(&self, k: usize) -> i64 {
        let k = i64::try_from(k).unwrap_or(i64::MAX);
        self.num_candidates.unwrap_or(k.saturating_mul(10)).max(k)
    }

    /// The configured URI, falling back to `MONGODB_URI`.
    pub fn resolve_uri(&self) -> Result<String, RagError> {
        self.resolve_uri_with(|key| std::env::var(key).ok())
    }

    /// Like [`resolve_uri`](Self::resolve_uri) with a custom variable lookup.
    pub fn resolve_uri_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, RagError> {
        self.uri
            .clone()
            .or_else(|| lookup(MONGODB_URI_ENV))
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| {
                RagError::Config(format!(
                    "no MongoDB URI configured; set `uri` or {MONGODB_URI_ENV}"
                ))
            })
    }

    /// Parse the URI and apply credentials, replica set, retry policy and app name.
    pub async fn client_options(&self) -> Result<ClientOptions, RagError> {
        let uri = self.resolve_uri()?;
        let mut options = ClientOptions::parse(&uri)
            .await
            .map_err(|e| RagError::Config(format!("invalid MongoDB URI: {e}")))?;
        self.apply_to(&mut options);
        Ok(options)
    }

    fn apply_to(&self, options: &mut ClientOptions) {
        if let Some(username) = &self.username {
            let mut credential = options.credential.take().unwrap_or_default();
            credential.username = Some(username.clone());
            credential.password = self.password.clone();
            options.credential = Some(credential);
        }
        if let Some(replica_set) = &self.replica_set {
            options.repl_set_name = Some(replica_set.clone());
        }
        options.retry_writes = Some(self.retry_writes);
        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use mongodb::options::Credential;

    use super::*;

    #[test]
    fn apply_to_sets_driver_options() {
        let config = MongoDbConfig::new()
            .with_credentials("alice", "s3cret")
            .with_replica_set("rs0")
            .with_retry_writes(false)
            .with_app_name("rag-app");

        let mut options = ClientOptions::builder().build();
        config.apply_to(&mut options);

        let credential: Credential = options.credential.clone().unwrap();
        assert_eq!(credential.username.as_deref(), Some("alice"));
        assert_eq!(credential.password.as_deref(), Some("s3cret"));
        assert_eq!(options.repl_set_name.as_deref(), Some("rs0"));
        assert_eq!(options.retry_writes, Some(false));
        assert_eq!(options.app_name.as_deref(), Some("rag-app"));
    }

    #[test]
    fn apply_to_leaves_credential_alone_without_username() {
        let mut options = ClientOptions::builder().build();
        MongoDbConfig::new().apply_to(&mut options);
        assert!(options.credential.is_none());
        assert!(options.repl_set_name.is_none());
        assert_eq!(options.retry_writes, Some(true));
    }

    #[test]
    fn debug_redacts_password() {
        let config = MongoDbConfig::new()
            .with_uri("mongodb://alice:pw@host")
            .with_credentials("alice", "hunter2");
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("alice:pw"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn num_candidates_default_and_floor() {
        let config = MongoDbConfig::new();
        assert_eq!(config.num_candidates_for(10), 100);

        let config = MongoDbConfig::new().with_num_candidates(5);
        assert_eq!(config.num_candidates_for(3), 5);
        assert_eq!(config.num_candidates_for(20), 20);
    }

    #[test]
    fn num_candidates_saturates_for_huge_k() {
        let config = MongoDbConfig::new();
        assert_eq!(config.num_candidates_for(1 << 62), i64::MAX);
        assert_eq!(config.num_candidates_for(usize::MAX), i64::MAX);

        let config = MongoDbConfig::new().with_num_candidates(5);
        assert_eq!(config.num_candidates_for(usize::MAX), i64::MAX);
    }
}
