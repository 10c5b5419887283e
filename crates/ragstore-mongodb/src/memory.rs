use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use ragstore_core::RagError;
use tokio::sync::RwLock;

use crate::convert::{bson_number, bson_to_vector};
use crate::filter::SCORE_FIELD;
use crate::store::{DocumentStore, VectorSearch};

/// Process-local [`DocumentStore`] for tests and demos.
///
/// Filters follow MongoDB query semantics for dotted paths, plain equality
/// (matching array elements too), `$eq`, `$ne`, `$in`, `$nin`, `$gt`, `$gte`,
/// `$lt`, `$lte`, `$exists`, `$and` and `$or`. Vector search ranks every
/// matching document by cosine similarity.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<BsonDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every document in a collection, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<BsonDocument> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_collection_names(&self) -> Result<Vec<String>, RagError> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, collection: &str) -> Result<(), RagError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(collection) {
            return Err(RagError::VectorStore(format!(
                "collection already exists: {collection}"
            )));
        }
        collections.insert(collection.to_string(), Vec::new());
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), RagError> {
        self.collections.write().await.remove(collection);
        Ok(())
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<BsonDocument>,
    ) -> Result<(), RagError> {
        if docs.is_empty() {
            return Ok(());
        }
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        limit: Option<i64>,
    ) -> Result<Vec<BsonDocument>, RagError> {
        let collections = self.collections.read().await;
        let matched = collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|doc| matches(doc, &filter))
            .cloned();
        // MongoDB treats a zero limit as "no limit" and a negative one by magnitude.
        Ok(match limit.map(|l| l.unsigned_abs()) {
            Some(l) if l > 0 => matched.take(l as usize).collect(),
            _ => matched.collect(),
        })
    }

    async fn vector_search(
        &self,
        collection: &str,
        search: VectorSearch,
    ) -> Result<Vec<BsonDocument>, RagError> {
        let collections = self.collections.read().await;
        let mut scored: Vec<(f32, &BsonDocument)> = collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|doc| matches(doc, &search.filter))
            .filter_map(|doc| {
                let stored = doc.get(&search.path).and_then(bson_to_vector)?;
                Some((cosine_similarity(&search.query_vector, &stored), doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(search.limit.max(0) as usize);

        Ok(scored
            .into_iter()
            .map(|(score, doc)| {
                let mut doc = doc.clone();
                doc.insert(SCORE_FIELD, score as f64);
                doc
            })
            .collect())
    }

    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<u64, RagError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !matches(doc, &filter));
        Ok((before - docs.len()) as u64)
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: BsonDocument,
    ) -> Result<u64, RagError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|doc| matches(doc, &filter))
            .count() as u64)
    }
}

// ---------------------------------------------------------------------------
// Filter evaluation
// ---------------------------------------------------------------------------

fn matches(doc: &BsonDocument, filter: &BsonDocument) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => sub_filters(condition).all(|f| matches(doc, f)),
        "$or" => sub_filters(condition).any(|f| matches(doc, f)),
        path => field_matches(lookup(doc, path), condition),
    })
}

fn sub_filters(condition: &Bson) -> impl Iterator<Item = &BsonDocument> {
    let items: &[Bson] = match condition {
        Bson::Array(items) => items.as_slice(),
        _ => &[],
    };
    items.iter().filter_map(Bson::as_document)
}

/// Resolve a dotted path through embedded documents.
fn lookup<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

fn is_operator_doc(condition: &Bson) -> Option<&BsonDocument> {
    condition
        .as_document()
        .filter(|d| !d.is_empty() && d.keys().all(|k| k.starts_with('$')))
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> bool {
    let Some(ops) = is_operator_doc(condition) else {
        return equals(value, condition);
    };
    ops.iter().all(|(op, operand)| match op.as_str() {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$in" => in_list(value, operand),
        "$nin" => !in_list(value, operand),
        "$gt" => compares(value, operand, |o| o == Ordering::Greater),
        "$gte" => compares(value, operand, |o| o != Ordering::Less),
        "$lt" => compares(value, operand, |o| o == Ordering::Less),
        "$lte" => compares(value, operand, |o| o != Ordering::Greater),
        "$exists" => value.is_some() == operand.as_bool().unwrap_or(true),
        _ => false,
    })
}

/// Equality with MongoDB's array rule: an array field matches when it equals
/// the operand or contains it. A missing field equals only `null`.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(value) => {
            scalar_eq(value, expected)
                || matches!(value, Bson::Array(items) if items.iter().any(|i| scalar_eq(i, expected)))
        }
    }
}

fn in_list(value: Option<&Bson>, operand: &Bson) -> bool {
    match operand {
        Bson::Array(candidates) => candidates.iter().any(|c| equals(value, c)),
        _ => false,
    }
}

fn compares(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(value) = value else {
        return false;
    };
    let candidates: Vec<&Bson> = match value {
        Bson::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    candidates
        .into_iter()
        .any(|v| compare(v, operand).is_some_and(&accept))
}

fn scalar_eq(a: &Bson, b: &Bson) -> bool {
    match (bson_number(a), bson_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (bson_number(a), bson_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Compute cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
