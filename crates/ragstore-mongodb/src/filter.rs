use bson::{doc, Document as BsonDocument};
use ragstore_core::WhereFilter;

use crate::convert::json_to_bson;

/// Field holding the caller-supplied record id.
pub const IDENTIFIER_FIELD: &str = "identifier";
/// Field holding the record text.
pub const TEXT_FIELD: &str = "text";
/// Embedded document holding the record metadata.
pub const METADATA_FIELD: &str = "metadata";
/// Field holding the embedding vector.
pub const EMBEDDING_FIELD: &str = "embedding";
/// Field the vector search projects its similarity score into.
pub const SCORE_FIELD: &str = "score";

/// Rewrite a flat `where` mapping into a filter on the embedded metadata document.
///
/// Each key `k` becomes `metadata.k`; values are copied as-is.
pub fn metadata_filter(filter: &WhereFilter) -> BsonDocument {
    filter
        .iter()
        .map(|(k, v)| (format!("{METADATA_FIELD}.{k}"), json_to_bson(v)))
        .collect()
}

/// Filter used by `get`: id membership (when ids are given) plus the metadata constraint.
pub(crate) fn get_filter(ids: Option<&[&str]>, filter: Option<&WhereFilter>) -> BsonDocument {
    let mut query = BsonDocument::new();
    if let Some(ids) = ids.filter(|ids| !ids.is_empty()) {
        query.insert(IDENTIFIER_FIELD, doc! { "$in": ids.to_vec() });
    }
    if let Some(filter) = filter {
        for (k, v) in metadata_filter(filter) {
            query.insert(k, v);
        }
    }
    query
}
