//! The typed journal event and its payload accessors.
//!
//! Payload shapes vary per event kind and the engine does not require a
//! closed schema for every kind. [`JournalEvent`] therefore carries the
//! full payload as an untyped JSON map, with typed accessors that apply
//! the reducer's defaulting rules: a missing or mistyped field reads as
//! `None`, and the `_or` variants substitute zero / empty / false.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::EventKind;

/// A single parsed journal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEvent {
    /// The event's own timestamp (UTC, second precision in practice).
    pub timestamp: DateTime<Utc>,
    /// The raw event name exactly as written by the game.
    pub name: String,
    /// The recognized kind derived from `name`.
    pub kind: EventKind,
    /// The complete payload, including the `timestamp` and `event` keys.
    pub payload: Map<String, Value>,
}

impl JournalEvent {
    /// Read a string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Read a string field, defaulting to the empty string.
    pub fn str_or_empty(&self, key: &str) -> String {
        self.str_field(key).unwrap_or_default().to_owned()
    }

    /// Read an unsigned integer field.
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }

    /// Read an unsigned integer field, defaulting to zero.
    pub fn u64_or_zero(&self, key: &str) -> u64 {
        self.u64_field(key).unwrap_or(0)
    }

    /// Read a signed integer field.
    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }

    /// Read a signed integer field, defaulting to zero.
    pub fn i64_or_zero(&self, key: &str) -> i64 {
        self.i64_field(key).unwrap_or(0)
    }

    /// Read a floating-point field (integers widen losslessly enough for
    /// journal magnitudes).
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Read a floating-point field, defaulting to zero.
    pub fn f64_or_zero(&self, key: &str) -> f64 {
        self.f64_field(key).unwrap_or(0.0)
    }

    /// Read a boolean field.
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.payload.get(key).and_then(Value::as_bool)
    }

    /// Read a boolean field, defaulting to false.
    pub fn bool_or_false(&self, key: &str) -> bool {
        self.bool_field(key).unwrap_or(false)
    }

    /// Read an array field.
    pub fn array_field(&self, key: &str) -> Option<&Vec<Value>> {
        self.payload.get(key).and_then(Value::as_array)
    }

    /// Read a nested object field.
    pub fn object_field(&self, key: &str) -> Option<&Map<String, Value>> {
        self.payload.get(key).and_then(Value::as_object)
    }

    /// Read a timestamp-valued string field (RFC 3339).
    pub fn datetime_field(&self, key: &str) -> Option<DateTime<Utc>> {
        self.str_field(key)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|fixed| fixed.with_timezone(&Utc))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    fn event(json: &str) -> JournalEvent {
        parse_line(json).unwrap()
    }

    #[test]
    fn typed_accessors_read_present_fields() {
        let ev = event(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame","Commander":"Jamie","Credits":1000,"FuelLevel":12.5,"Odyssey":true}"#,
        );
        assert_eq!(ev.str_field("Commander"), Some("Jamie"));
        assert_eq!(ev.i64_field("Credits"), Some(1000));
        assert_eq!(ev.f64_field("FuelLevel"), Some(12.5));
        assert_eq!(ev.bool_field("Odyssey"), Some(true));
    }

    #[test]
    fn missing_fields_read_as_documented_defaults() {
        let ev = event(r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame"}"#);
        assert_eq!(ev.str_or_empty("Commander"), "");
        assert_eq!(ev.i64_or_zero("Credits"), 0);
        assert!(ev.f64_or_zero("JumpDist").abs() < f64::EPSILON);
        assert!(!ev.bool_or_false("Odyssey"));
        assert!(ev.array_field("Inventory").is_none());
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        let ev = event(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame","Credits":"a lot"}"#,
        );
        assert_eq!(ev.i64_field("Credits"), None);
        assert_eq!(ev.i64_or_zero("Credits"), 0);
    }

    #[test]
    fn integer_fields_widen_to_float() {
        let ev = event(r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSDJump","JumpDist":10}"#);
        assert!((ev.f64_or_zero("JumpDist") - 10.0).abs() < f64::EPSILON);
    }
}
