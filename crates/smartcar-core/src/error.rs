//! Classification of non-2xx API responses.
//!
//! The platform has answered with two error wire formats over its life: a
//! legacy flat shape (`{"error": ..., "message": ...}`) and the structured
//! v2 shape (`{"type", "code", "description", ...}`). Both reduce to one
//! [`SmartcarApiError`] here so callers never need to know which upstream
//! version responded.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::headers::Headers;
use crate::meta::REQUEST_ID_HEADER;
use crate::value::{normalize, Record, StructuredValue};

/// `type` assigned to failures manufactured by this library rather than
/// reported by the API (undecodable body, unrecognized shape).
pub const SDK_ERROR_TYPE: &str = "SDK_ERROR";

const RETRY_AFTER_HEADER: &str = "retry-after";

/// A structured error received from the Smartcar API.
///
/// Always corresponds to an actual HTTP response; transport failures are a
/// different error and never coerced into this type. Constructed once by
/// [`classify`] and immutable afterwards.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SmartcarApiError {
    /// HTTP status of the response (or batch sub-response) that produced
    /// this error.
    pub status_code: u16,
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub request_id: Option<String>,
    pub doc_url: Option<String>,
    /// Suggested resolution. A bare string on the wire is wrapped as a
    /// record with a single `type` field; an object normalizes directly.
    pub resolution: Option<StructuredValue>,
    pub retry_after: Option<String>,
    /// The v2 `detail` payload, when present.
    pub detail: Option<StructuredValue>,
    /// Stable human-readable summary: `"{type}:{code} - {description}"`,
    /// or the verbatim body for non-JSON responses.
    pub message: String,
}

impl SmartcarApiError {
    /// An error manufactured by the SDK itself, for responses with no
    /// parseable API payload (undecodable success body, malformed batch
    /// envelope).
    pub fn sdk(status_code: u16, description: impl Into<String>, request_id: Option<String>) -> Self {
        let description = description.into();
        SmartcarApiError {
            status_code,
            error_type: Some(SDK_ERROR_TYPE.to_string()),
            code: None,
            message: format!("{SDK_ERROR_TYPE}: - {description}"),
            description: Some(description),
            request_id,
            doc_url: None,
            resolution: None,
            retry_after: None,
            detail: None,
        }
    }
}

/// Inspect a response and produce an error for it, or `None` for the
/// success statuses 200 and 204. Never drops an error: any other status
/// yields `Some`, whatever the body looks like.
pub fn classify(status: u16, body: &str, headers: &Headers) -> Option<SmartcarApiError> {
    if matches!(status, 200 | 204) {
        return None;
    }

    let is_json = headers
        .get("content-type")
        .is_some_and(|content_type| content_type.contains("application/json"));
    if !is_json {
        debug!(status, "non-JSON error response");
        return Some(SmartcarApiError {
            status_code: status,
            error_type: None,
            code: None,
            description: None,
            request_id: headers.get(REQUEST_ID_HEADER).map(str::to_string),
            doc_url: None,
            resolution: None,
            retry_after: None,
            detail: None,
            message: body.to_string(),
        });
    }

    let fields = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => sdk_error_fields(body.to_string()),
        Err(decode_error) => sdk_error_fields(decode_error.to_string()),
    };
    Some(from_fields(status, fields, headers))
}

fn sdk_error_fields(description: String) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("type".into(), Value::String(SDK_ERROR_TYPE.into()));
    fields.insert("description".into(), Value::String(description));
    fields
}

fn from_fields(status: u16, mut fields: Map<String, Value>, headers: &Headers) -> SmartcarApiError {
    // Legacy shape: `error` plays the role of `type` and the description
    // falls back through `error_description`, then `message`.
    if let Some(error) = fields.remove("error") {
        fields.entry("type").or_insert(error);
    }
    if !fields.contains_key("description") {
        let description = fields
            .remove("error_description")
            .or_else(|| fields.remove("message"))
            .unwrap_or_else(|| Value::String("Unknown error".into()));
        fields.insert("description".into(), description);
    }
    // A body with neither shape marker is not a recognized API error.
    if !fields.contains_key("type") {
        fields.insert("type".into(), Value::String(SDK_ERROR_TYPE.into()));
    }

    let error_type = string_field(&fields, "type");
    let code = string_field(&fields, "code");
    let description = string_field(&fields, "description");
    let message = format!(
        "{}:{} - {}",
        error_type.as_deref().unwrap_or_default(),
        code.as_deref().unwrap_or_default(),
        description.as_deref().unwrap_or_default()
    );

    let resolution = match fields.get("resolution") {
        None | Some(Value::Null) => None,
        Some(Value::String(kind)) => {
            let mut record = Record::new();
            record.insert("type", StructuredValue::String(kind.clone()));
            Some(StructuredValue::Record(record))
        }
        Some(other) => Some(normalize(other.clone())),
    };

    debug!(status, error_type = error_type.as_deref(), "classified API error");

    SmartcarApiError {
        status_code: status,
        request_id: string_field(&fields, "requestId")
            .or_else(|| headers.get(REQUEST_ID_HEADER).map(str::to_string)),
        doc_url: string_field(&fields, "docURL"),
        resolution,
        retry_after: headers.get(RETRY_AFTER_HEADER).map(str::to_string),
        detail: match fields.get("detail") {
            None | Some(Value::Null) => None,
            Some(detail) => Some(normalize(detail.clone())),
        },
        error_type,
        code,
        description,
        message,
    }
}

/// Read a field as text. Non-string scalars render as their JSON text so a
/// sloppy upstream value degrades instead of disappearing.
fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn json_headers() -> Headers {
        [
            ("content-type", "application/json"),
            ("sc-request-id", "request_id"),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case(200)]
    #[case(204)]
    fn success_statuses_classify_as_none(#[case] status: u16) {
        assert!(classify(status, "{}", &json_headers()).is_none());
    }

    #[rstest]
    #[case(400)]
    #[case(401)]
    #[case(403)]
    #[case(404)]
    #[case(409)]
    #[case(500)]
    #[case(504)]
    fn failure_statuses_always_produce_an_error(#[case] status: u16) {
        let error = classify(status, "{}", &json_headers()).unwrap();
        assert_eq!(error.status_code, status);
    }

    #[test]
    fn non_json_body_becomes_verbatim_message() {
        let error = classify(504, "pizza", &Headers::new()).unwrap();
        assert_eq!(error.status_code, 504);
        assert_eq!(error.message, "pizza");
        assert_eq!(error.error_type, None);
        assert_eq!(error.request_id, None);
    }

    #[test]
    fn undecodable_json_becomes_sdk_error() {
        let error = classify(504, "pizza", &json_headers()).unwrap();
        assert_eq!(error.status_code, 504);
        assert_eq!(error.error_type.as_deref(), Some(SDK_ERROR_TYPE));
        assert!(error.description.is_some());
        assert_eq!(error.request_id.as_deref(), Some("request_id"));
    }

    #[test]
    fn legacy_shape_coerces_error_to_type() {
        let body = json!({"error": "monkeys_on_mars", "message": "yes, really"}).to_string();
        let error = classify(500, &body, &json_headers()).unwrap();
        assert_eq!(error.message, "monkeys_on_mars: - yes, really");
        assert_eq!(error.error_type.as_deref(), Some("monkeys_on_mars"));
        assert_eq!(error.description.as_deref(), Some("yes, really"));
        assert_eq!(error.request_id.as_deref(), Some("request_id"));
    }

    #[test]
    fn legacy_shape_without_message_reports_unknown_error() {
        let body = json!({"error": "server_error"}).to_string();
        let error = classify(500, &body, &json_headers()).unwrap();
        assert_eq!(error.description.as_deref(), Some("Unknown error"));
        assert_eq!(error.message, "server_error: - Unknown error");
    }

    #[test]
    fn structured_shape_maps_directly() {
        let body = json!({
            "type": "VEHICLE_STATE",
            "code": "UNKNOWN",
            "description": "desc",
            "requestId": "123",
            "statusCode": 409
        })
        .to_string();
        let error = classify(409, &body, &json_headers()).unwrap();
        assert_eq!(error.message, "VEHICLE_STATE:UNKNOWN - desc");
        assert_eq!(error.error_type.as_deref(), Some("VEHICLE_STATE"));
        assert_eq!(error.code.as_deref(), Some("UNKNOWN"));
        // Body requestId wins over the header.
        assert_eq!(error.request_id.as_deref(), Some("123"));
        assert_eq!(error.resolution, None);
    }

    #[test]
    fn string_resolution_wraps_into_typed_record() {
        let body = json!({
            "type": "VEHICLE_STATE",
            "code": "UNREACHABLE",
            "description": "desc",
            "resolution": "RETRY_LATER"
        })
        .to_string();
        let error = classify(409, &body, &json_headers()).unwrap();
        let resolution = error.resolution.unwrap();
        assert_eq!(resolution.get("type").unwrap().as_str(), Some("RETRY_LATER"));
    }

    #[test]
    fn object_resolution_normalizes_directly() {
        let body = json!({
            "type": "type",
            "code": "code",
            "description": "description",
            "resolution": {"pizza": "x"}
        })
        .to_string();
        let error = classify(500, &body, &json_headers()).unwrap();
        assert_eq!(
            error.resolution.unwrap().get("pizza").unwrap().as_str(),
            Some("x")
        );
    }

    #[test]
    fn null_resolution_stays_none() {
        let body = json!({"type": "t", "description": "d", "resolution": null}).to_string();
        let error = classify(409, &body, &json_headers()).unwrap();
        assert_eq!(error.resolution, None);
    }

    #[test]
    fn shapeless_body_folds_into_sdk_error() {
        let body = json!({
            "description": "description",
            "requestId": "123",
            "statusCode": 500,
            "resolution": {"pizza": "resolution"}
        })
        .to_string();
        let error = classify(500, &body, &json_headers()).unwrap();
        assert_eq!(error.error_type.as_deref(), Some(SDK_ERROR_TYPE));
        assert_eq!(error.description.as_deref(), Some("description"));
        assert_eq!(error.request_id.as_deref(), Some("123"));
        assert_eq!(
            error.resolution.unwrap().get("pizza").unwrap().as_str(),
            Some("resolution")
        );
    }

    #[test]
    fn retry_after_header_is_carried() {
        let headers: Headers = [
            ("content-type", "application/json"),
            ("retry-after", "30"),
        ]
        .into_iter()
        .collect();
        let body = json!({"type": "RATE_LIMIT", "description": "slow down"}).to_string();
        let error = classify(429, &body, &headers).unwrap();
        assert_eq!(error.retry_after.as_deref(), Some("30"));
    }

    #[test]
    fn detail_payload_is_preserved() {
        let body = json!({
            "type": "VALIDATION",
            "code": null,
            "description": "Request invalid or malformed.",
            "detail": [{"field": ["vin"], "message": "Required"}]
        })
        .to_string();
        let error = classify(400, &body, &json_headers()).unwrap();
        let detail = error.detail.unwrap();
        let first = &detail.as_list().unwrap()[0];
        assert_eq!(first.get("message").unwrap().as_str(), Some("Required"));
        assert_eq!(error.code, None);
    }

    #[test]
    fn display_uses_the_message() {
        let body = json!({"error": "monkeys_on_mars", "message": "yes, really"}).to_string();
        let error = classify(500, &body, &json_headers()).unwrap();
        assert_eq!(error.to_string(), "monkeys_on_mars: - yes, really");
    }
}
