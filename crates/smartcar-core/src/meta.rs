//! Response metadata drawn from the `sc-*` headers.

use chrono::{DateTime, Utc};

use crate::headers::Headers;
use crate::value::{Record, StructuredValue};

/// Header carrying the upstream request id.
pub const REQUEST_ID_HEADER: &str = "sc-request-id";
/// Header carrying the age of the vehicle data, ISO 8601.
pub const DATA_AGE_HEADER: &str = "sc-data-age";
/// Header carrying the unit system the body was rendered in.
pub const UNIT_SYSTEM_HEADER: &str = "sc-unit-system";
/// Header carrying the fetch timestamp, ISO 8601.
pub const FETCHED_AT_HEADER: &str = "sc-fetched-at";

/// Metadata attached to every successful response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMeta {
    pub request_id: Option<String>,
    pub data_age: Option<DateTime<Utc>>,
    pub unit_system: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ResponseMeta {
    /// Render as a record for attachment to a normalized response body.
    /// Timestamps serialize back to RFC 3339.
    pub fn to_value(&self) -> StructuredValue {
        let mut record = Record::new();
        if let Some(request_id) = &self.request_id {
            record.insert("request_id", StructuredValue::String(request_id.clone()));
        }
        if let Some(data_age) = &self.data_age {
            record.insert("data_age", StructuredValue::String(data_age.to_rfc3339()));
        }
        if let Some(unit_system) = &self.unit_system {
            record.insert("unit_system", StructuredValue::String(unit_system.clone()));
        }
        if let Some(fetched_at) = &self.fetched_at {
            record.insert("fetched_at", StructuredValue::String(fetched_at.to_rfc3339()));
        }
        StructuredValue::Record(record)
    }
}

/// Build [`ResponseMeta`] from response headers.
///
/// Timestamp headers that fail to parse yield `None` for that field; a
/// malformed header must never fail an otherwise successful response.
pub fn build_meta(headers: &Headers) -> ResponseMeta {
    ResponseMeta {
        request_id: headers.get(REQUEST_ID_HEADER).map(str::to_string),
        data_age: headers.get(DATA_AGE_HEADER).and_then(parse_timestamp),
        unit_system: headers.get(UNIT_SYSTEM_HEADER).map(str::to_string),
        fetched_at: headers.get(FETCHED_AT_HEADER).and_then(parse_timestamp),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_headers() -> Headers {
        [
            ("sc-request-id", "request_id"),
            ("sc-data-age", "2023-05-04T07:20:50.844Z"),
            ("sc-unit-system", "metric"),
            ("sc-fetched-at", "2023-05-04T07:20:51.844Z"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn builds_meta_from_valid_headers() {
        let meta = build_meta(&full_headers());
        assert_eq!(meta.request_id.as_deref(), Some("request_id"));
        assert_eq!(meta.unit_system.as_deref(), Some("metric"));
        assert_eq!(
            meta.data_age.unwrap().to_rfc3339(),
            "2023-05-04T07:20:50.844+00:00"
        );
        assert_eq!(
            meta.fetched_at.unwrap().to_rfc3339(),
            "2023-05-04T07:20:51.844+00:00"
        );
    }

    #[test]
    fn missing_headers_stay_none() {
        let headers: Headers = [("sc-request-id", "request_id"), ("sc-unit-system", "metric")]
            .into_iter()
            .collect();
        let meta = build_meta(&headers);
        assert_eq!(meta.request_id.as_deref(), Some("request_id"));
        assert_eq!(meta.data_age, None);
        assert_eq!(meta.fetched_at, None);
    }

    #[test]
    fn unparseable_timestamps_stay_none() {
        let headers: Headers = [
            ("sc-request-id", "request_id"),
            ("sc-data-age", "invalid-date-format"),
            ("sc-fetched-at", "another-invalid-date"),
        ]
        .into_iter()
        .collect();
        let meta = build_meta(&headers);
        assert_eq!(meta.request_id.as_deref(), Some("request_id"));
        assert_eq!(meta.data_age, None);
        assert_eq!(meta.fetched_at, None);
    }

    #[test]
    fn renders_only_present_fields() {
        let headers: Headers = [("sc-request-id", "abc")].into_iter().collect();
        let value = build_meta(&headers).to_value();
        let record = value.as_record().unwrap();
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["request_id"]);
    }
}
