use bson::{Bson, Document as BsonDocument};
use ragstore_core::Metadata;
use serde_json::Value;

/// Convert a metadata map to a BSON document.
pub(crate) fn metadata_to_bson(map: &Metadata) -> BsonDocument {
    map.iter()
        .map(|(k, v)| (k.clone(), json_to_bson(v)))
        .collect()
}

/// Convert a BSON document to a metadata map.
pub(crate) fn bson_to_metadata(doc: &BsonDocument) -> Metadata {
    doc.iter()
        .map(|(k, v)| (k.clone(), bson_to_json(v)))
        .collect()
}

/// Convert an embedding to a BSON array of doubles.
pub(crate) fn vector_to_bson(vector: &[f32]) -> Bson {
    Bson::Array(vector.iter().map(|v| Bson::Double(*v as f64)).collect())
}

/// Read a BSON array of numbers back as an embedding.
pub(crate) fn bson_to_vector(bson: &Bson) -> Option<Vec<f32>> {
    match bson {
        Bson::Array(items) => items
            .iter()
            .map(|item| bson_number(item).map(|n| n as f32))
            .collect(),
        _ => None,
    }
}

/// Numeric value of any BSON number type.
pub(crate) fn bson_number(bson: &Bson) -> Option<f64> {
    match bson {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

/// Convert a `serde_json::Value` to a `bson::Bson` value.
pub(crate) fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Bson::Int64(i)
            } else if let Some(f) = n.as_f64() {
                Bson::Double(f)
            } else {
                Bson::Null
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(arr) => Bson::Array(arr.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_bson(v)))
                .collect(),
        ),
    }
}

/// Convert a `bson::Bson` value to a `serde_json::Value`.
pub(crate) fn bson_to_json(bson: &Bson) -> Value {
    match bson {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Number((*i as i64).into()),
        Bson::Int64(i) => Value::Number((*i).into()),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(arr) => Value::Array(arr.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(
            doc.iter()
                .map(|(k, v)| (k.clone(), bson_to_json(v)))
                .collect(),
        ),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(dt.to_string()),
        Bson::Binary(bin) => Value::String(format!("<binary {} bytes>", bin.bytes.len())),
        _ => Value::String(format!("{bson}")),
    }
}
