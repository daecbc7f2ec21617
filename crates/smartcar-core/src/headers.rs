//! A transport-neutral header map.
//!
//! The classifier and meta builder read headers from two sources with
//! different shapes: real HTTP responses and the per-item `headers` objects
//! inside a batch payload. Both are funneled into this type so the core
//! stays independent of any HTTP client.

use serde_json::Value;

/// Ordered header collection with case-insensitive name lookup.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Overlay `other` on top of this map: entries from `other` win on
    /// name conflicts. Used for batch items, whose own headers take
    /// precedence over the outer response headers.
    pub fn merged_with(&self, other: &Headers) -> Headers {
        let mut merged = self.clone();
        for (name, value) in other.iter() {
            merged.insert(name, value);
        }
        merged
    }

    /// Build from a JSON object of string values, as found in batch
    /// sub-responses. Non-string values are rendered as their JSON text.
    pub fn from_json_object(value: &Value) -> Headers {
        let mut headers = Headers::new();
        if let Value::Object(map) = value {
            for (name, value) in map {
                match value {
                    Value::String(s) => headers.insert(name, s.clone()),
                    Value::Null => {}
                    other => headers.insert(name, other.to_string()),
                }
            }
        }
        headers
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_is_case_insensitive() {
        let headers: Headers = [("SC-Request-Id", "abc")].into_iter().collect();
        assert_eq!(headers.get("sc-request-id"), Some("abc"));
        assert_eq!(headers.get("SC-REQUEST-ID"), Some("abc"));
        assert_eq!(headers.get("sc-data-age"), None);
    }

    #[test]
    fn merge_prefers_overlay() {
        let outer: Headers = [("content-type", "application/json"), ("sc-unit-system", "metric")]
            .into_iter()
            .collect();
        let item: Headers = [("sc-unit-system", "imperial")].into_iter().collect();
        let merged = outer.merged_with(&item);
        assert_eq!(merged.get("sc-unit-system"), Some("imperial"));
        assert_eq!(merged.get("content-type"), Some("application/json"));
    }

    #[test]
    fn builds_from_json_object() {
        let headers = Headers::from_json_object(&json!({
            "sc-data-age": "2019-10-24T00:43:46.000Z",
            "x-ratelimit": 20
        }));
        assert_eq!(headers.get("sc-data-age"), Some("2019-10-24T00:43:46.000Z"));
        assert_eq!(headers.get("x-ratelimit"), Some("20"));
    }
}
