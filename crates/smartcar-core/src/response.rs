//! Assembly of normalized response envelopes.

use serde_json::Value;

use crate::headers::Headers;
use crate::meta::build_meta;
use crate::value::{normalize, Record, StructuredValue};

/// Normalize a response body and attach its header-derived `meta` record.
///
/// Object bodies get `meta` as an extra field. Some endpoints (service
/// history, for one) return a top-level array; those are wrapped under an
/// `items` field so `meta` can ride alongside uniformly. Scalar bodies are
/// wrapped under `value`, and a `Null` body (empty 204 response) yields a
/// record holding only `meta`.
pub fn build_response(body: Value, headers: &Headers) -> StructuredValue {
    let meta = build_meta(headers).to_value();
    let mut record = match normalize(body) {
        StructuredValue::Record(record) => record,
        StructuredValue::List(items) => {
            let mut record = Record::new();
            record.insert("items", StructuredValue::List(items));
            record
        }
        StructuredValue::Null => Record::new(),
        scalar => {
            let mut record = Record::new();
            record.insert("value", scalar);
            record
        }
    };
    record.insert("meta", meta);
    StructuredValue::Record(record)
}
