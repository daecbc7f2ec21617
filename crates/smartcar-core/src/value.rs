//! Structured values: the normalized representation of API response JSON.
//!
//! Every response body is converted into a [`StructuredValue`] tree so that
//! callers get one uniform, introspectable shape regardless of which endpoint
//! produced it. Records keep the field order of the source JSON and stay
//! addressable by field name after aliases or metadata are attached.

use serde_json::Value;

/// A normalized JSON value.
///
/// Scalars pass through unchanged; arrays and objects are normalized
/// element-wise and field-wise. Use the typed accessors (`as_record`,
/// `as_str`, ...) to read leaves without matching on the enum.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<StructuredValue>),
    Record(Record),
}

/// An ordered field map. Lookups are by exact field name; insertion replaces
/// an existing field in place so repeated writes stay idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, StructuredValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&StructuredValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert a field, replacing an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, value: StructuredValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StructuredValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, StructuredValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, StructuredValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl StructuredValue {
    pub fn is_null(&self) -> bool {
        matches!(self, StructuredValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StructuredValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StructuredValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StructuredValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StructuredValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StructuredValue]> {
        match self {
            StructuredValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            StructuredValue::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            StructuredValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Shortcut for record field access. Returns `None` when this value is
    /// not a record or the field is absent.
    pub fn get(&self, name: &str) -> Option<&StructuredValue> {
        self.as_record().and_then(|record| record.get(name))
    }

    /// Convert back to plain JSON, preserving field order.
    pub fn to_json(&self) -> Value {
        match self {
            StructuredValue::Null => Value::Null,
            StructuredValue::Bool(b) => Value::Bool(*b),
            StructuredValue::Number(n) => Value::Number(n.clone()),
            StructuredValue::String(s) => Value::String(s.clone()),
            StructuredValue::List(items) => {
                Value::Array(items.iter().map(StructuredValue::to_json).collect())
            }
            StructuredValue::Record(record) => {
                let mut map = serde_json::Map::new();
                for (name, value) in record.iter() {
                    map.insert(name.to_string(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

/// Normalize an arbitrary JSON value.
///
/// Total over any JSON-decodable input: arrays normalize element-wise,
/// objects field-wise in source order, scalars pass through.
pub fn normalize(value: Value) -> StructuredValue {
    match value {
        Value::Null => StructuredValue::Null,
        Value::Bool(b) => StructuredValue::Bool(b),
        Value::Number(n) => StructuredValue::Number(n),
        Value::String(s) => StructuredValue::String(s),
        Value::Array(items) => {
            StructuredValue::List(items.into_iter().map(normalize).collect())
        }
        Value::Object(map) => StructuredValue::Record(
            map.into_iter()
                .map(|(name, value)| (name, normalize(value)))
                .collect(),
        ),
    }
}

impl From<Value> for StructuredValue {
    fn from(value: Value) -> Self {
        normalize(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn normalizes_scalars_unchanged() {
        assert_eq!(normalize(json!(null)), StructuredValue::Null);
        assert_eq!(normalize(json!(true)), StructuredValue::Bool(true));
        assert_eq!(normalize(json!("t")), StructuredValue::String("t".into()));
        assert_eq!(normalize(json!(42)).as_i64(), Some(42));
        assert_eq!(normalize(json!(0.5)).as_f64(), Some(0.5));
    }

    #[test]
    fn preserves_field_names_and_order() {
        let value = normalize(json!({"zeta": 1, "alpha": {"beta": [1, 2]}, "mid": null}));
        let record = value.as_record().unwrap();
        let names: Vec<_> = record.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(value.get("alpha").unwrap().get("beta").unwrap().as_list().unwrap().len(), 2);
    }

    #[test]
    fn preserves_array_element_order() {
        let value = normalize(json!([3, 1, 2]));
        let items = value.as_list().unwrap();
        let order: Vec<_> = items.iter().map(|v| v.as_i64().unwrap()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn record_insert_replaces_in_place() {
        let mut record = Record::new();
        record.insert("a", StructuredValue::Bool(true));
        record.insert("b", StructuredValue::Bool(false));
        record.insert("a", StructuredValue::String("again".into()));
        assert_eq!(record.len(), 2);
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a").unwrap().as_str(), Some("again"));
    }

    #[test]
    fn round_trips_through_json() {
        let source = json!({"a": [{"b": 1}, "x"], "c": {"d": null}});
        assert_eq!(normalize(source.clone()).to_json(), source);
    }
}
