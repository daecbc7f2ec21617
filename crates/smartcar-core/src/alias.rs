//! Ergonomic field aliases.
//!
//! The wire format uses camelCase field names (`isPluggedIn`); resource
//! definitions can declare snake_case aliases for them. Aliasing copies the
//! value under the new name and leaves the original readable, so callers
//! keyed to the literal wire field keep working.

use crate::value::StructuredValue;

/// Static alias table: `(wire field name, alias name)` pairs.
pub type AliasTable = [(&'static str, &'static str)];

/// Add alias fields to a normalized response.
///
/// Absent wire fields are skipped. Applying the same table twice is a
/// no-op beyond the first application, since record insertion replaces.
pub fn apply_aliases(mut value: StructuredValue, aliases: &AliasTable) -> StructuredValue {
    if aliases.is_empty() {
        return value;
    }
    if let Some(record) = value.as_record_mut() {
        for (wire_name, alias) in aliases {
            if let Some(found) = record.get(wire_name).cloned() {
                record.insert(*alias, found);
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CHARGE_ALIASES: &AliasTable = &[("isPluggedIn", "is_plugged_in")];

    #[test]
    fn copies_value_and_keeps_original() {
        let value = apply_aliases(normalize(json!({"isPluggedIn": true, "state": "CHARGING"})), CHARGE_ALIASES);
        assert_eq!(value.get("isPluggedIn").unwrap().as_bool(), Some(true));
        assert_eq!(value.get("is_plugged_in").unwrap().as_bool(), Some(true));
        assert_eq!(value.get("state").unwrap().as_str(), Some("CHARGING"));
    }

    #[test]
    fn skips_absent_wire_fields() {
        let value = apply_aliases(normalize(json!({"state": "CHARGING"})), CHARGE_ALIASES);
        assert!(value.get("is_plugged_in").is_none());
    }

    #[test]
    fn is_idempotent() {
        let once = apply_aliases(normalize(json!({"isPluggedIn": false})), CHARGE_ALIASES);
        let twice = apply_aliases(once.clone(), CHARGE_ALIASES);
        assert_eq!(once, twice);
    }

    #[test]
    fn non_record_values_pass_through() {
        let value = apply_aliases(StructuredValue::Bool(true), CHARGE_ALIASES);
        assert_eq!(value, StructuredValue::Bool(true));
    }
}
