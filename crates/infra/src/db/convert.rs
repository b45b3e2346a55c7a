//! Conversions between stored BSON documents and the JSON the API speaks.
//!
//! Object ids render as 24-digit hex strings and datetimes as ISO-8601
//! strings with millisecond precision, matching what clients already expect.

use bson::{Bson, Document as BsonDocument};
use chrono::SecondsFormat;
use serde_json::{Number, Value};

use parcelhub_core::Document;

use super::StoreResult;

/// Encode a client-supplied JSON object as a BSON document.
///
/// Any client-supplied `_id` is dropped; stores always generate their own.
pub fn to_bson_document(mut doc: Document) -> StoreResult<BsonDocument> {
    doc.remove("_id");
    Ok(bson::to_document(&doc)?)
}

pub fn to_json_document(doc: BsonDocument) -> Document {
    doc.into_iter().map(|(k, v)| (k, to_json(v))).collect()
}

pub fn to_json(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(n) => Value::Number(n.into()),
        Bson::Int64(n) => Value::Number(n.into()),
        Bson::Double(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        Bson::String(s) | Bson::Symbol(s) => Value::String(s),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(
            dt.to_chrono()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        Bson::Document(doc) => Value::Object(to_json_document(doc)),
        other => other.into_relaxed_extjson(),
    }
}
